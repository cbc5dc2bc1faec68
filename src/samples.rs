//! Example data used to seed a fresh form and as display-only placeholders
//! in the preview header.

use crate::record::*;
use crate::session::DocumentType;

fn edu(year: &str, level: &str, school: &str, qualification: &str) -> EducationEntry {
    EducationEntry {
        year: year.into(),
        level: level.into(),
        school: school.into(),
        qualification: qualification.into(),
    }
}

fn work(title: &str, company: &str, period: &str, description: &str) -> WorkEntry {
    WorkEntry {
        title: title.into(),
        company: company.into(),
        period: period.into(),
        description: description.into(),
    }
}

fn project(name: &str, tech: &str, description: &str) -> ProjectEntry {
    ProjectEntry {
        name: name.into(),
        tech: tech.into(),
        description: description.into(),
    }
}

fn certification(name: &str, issuer: &str, year: &str) -> CertificationEntry {
    CertificationEntry {
        name: name.into(),
        issuer: issuer.into(),
        year: year.into(),
    }
}

/// The record a new form starts with.
pub fn example_record(doc_type: DocumentType) -> FieldRecord {
    match doc_type {
        DocumentType::Cv => example_cv(),
        DocumentType::Resume => example_resume(),
    }
}

fn example_cv() -> FieldRecord {
    FieldRecord {
        name: "John Banda".into(),
        email: "john.banda@email.com".into(),
        phone: "+123 456 7890".into(),
        website: "www.johnbanda.com".into(),
        summary: "Motivated IT specialist with 4+ years of experience in software development \
                  and system administration. Proven track record of delivering high-quality \
                  solutions and leading cross-functional teams."
            .into(),
        address: Address::Structured(PostalAddress {
            street: "123 Main St".into(),
            city: "Lusaka".into(),
            state: String::new(),
            country: "Zambia".into(),
        }),
        education: vec![
            edu("2015-2017", "Tertiary", "Rockview University", "Diploma in Computer Science"),
            edu("2010-2014", "Grade 12", "Central High School", "Certificate"),
        ]
        .into(),
        work: vec![
            work(
                "Junior Developer",
                "TechLabs Inc.",
                "2021-2023",
                "Developed and maintained web applications using Python and React. \
                 Collaborated with senior developers on system architecture improvements.",
            ),
            work(
                "Software Intern",
                "StartupCorp",
                "2020-2021",
                "Assisted in developing REST APIs and database management systems. \
                 Participated in code reviews and agile ceremonies.",
            ),
        ]
        .into(),
        research: vec![ResearchEntry {
            title: "Deep Learning Applications".into(),
            institution: "Research Institute".into(),
            period: "2019-2020".into(),
            description: "Research on applying deep learning techniques to medical image analysis."
                .into(),
        }]
        .into(),
        publications: vec![PublicationEntry {
            title: "Optimizing Neural Networks for Real-Time Processing".into(),
            venue: "IEEE Conference 2020".into(),
            year: "2020".into(),
        }]
        .into(),
        certifications: vec![
            certification("AWS Certified Developer", "Amazon Web Services", "2022"),
            certification("Certified Python Developer", "Python Institute", "2021"),
        ]
        .into(),
        conferences: vec![
            ConferenceEntry {
                name: "Tech Conference 2023".into(),
                location: "San Francisco, USA".into(),
                year: "2023".into(),
            },
            ConferenceEntry {
                name: "AI Workshop 2022".into(),
                location: "Online".into(),
                year: "2022".into(),
            },
        ]
        .into(),
        achievements: vec![
            AchievementEntry {
                description: "Winner of National Coding Competition 2022".into(),
            },
            AchievementEntry {
                description: "Published 3 research papers in peer-reviewed journals".into(),
            },
        ]
        .into(),
        projects: vec![
            project(
                "E-Commerce Platform",
                "Python, Django, React, PostgreSQL",
                "Full-stack e-commerce solution with payment integration and inventory management.",
            ),
            project(
                "Machine Learning API",
                "Python, Flask, TensorFlow",
                "RESTful API for image classification using deep learning models.",
            ),
        ]
        .into(),
        references: vec![ReferenceEntry {
            name: "Dr. Mary Phiri".into(),
            position: "Head of Computing, Rockview University".into(),
            phone: "+260 97 000 0000".into(),
            email: "m.phiri@rockview.edu".into(),
        }]
        .into(),
        skills: Skills::Tags(
            [
                "Python",
                "JavaScript",
                "React",
                "Node.js",
                "Networking",
                "UI Design",
                "Database Management",
                "Git",
                "Docker",
                "AWS",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        ),
    }
}

fn example_resume() -> FieldRecord {
    FieldRecord {
        name: "Sarah Johnson".into(),
        email: "sarah.j@email.com".into(),
        phone: "+1 (555) 123-4567".into(),
        website: "linkedin.com/in/sarahjohnson".into(),
        summary: "Results-driven software engineer with 3+ years of experience building scalable \
                  web applications. Passionate about clean code and user experience."
            .into(),
        address: Address::Flat("New York, NY".into()),
        work: vec![work(
            "Software Engineer",
            "TechStart Inc.",
            "2021-Present",
            "• Led development of customer portal\n• Implemented CI/CD pipeline\n• Mentored 2 junior developers",
        )]
        .into(),
        projects: vec![project(
            "Task Management App",
            "React, Node.js, MongoDB",
            "Full-stack application for team collaboration.",
        )]
        .into(),
        education: vec![
            edu("2015-2019", "Bachelor", "State University", "B.S. Computer Science"),
            edu("2011-2015", "High School", "Central High School", "Diploma"),
        ]
        .into(),
        certifications: vec![certification("AWS Solutions Architect", "", "2022")].into(),
        skills: Skills::Text("JavaScript, React, Node.js, Python, AWS, Docker, Git".into()),
        ..FieldRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_fill_their_sections() {
        let cv = example_record(DocumentType::Cv);
        for list in ListName::ALL {
            assert!(!cv.list_is_blank(list), "CV example leaves {list} blank");
        }
        let resume = example_record(DocumentType::Resume);
        assert!(resume.list_is_blank(ListName::Research));
        assert!(!resume.skills.is_blank());
    }
}
