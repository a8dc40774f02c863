//! Built-in sample dataset.
//!
//! Used whenever no remote store is configured or reachable, and to seed
//! an empty remote. Every call returns identical data.

use crate::domain::{
    ChecklistItem, Client, ClientId, ClientStatus, Deal, DealId, DealStage, Project, ProjectId,
    ProjectStatus, Task, TaskId, TaskPriority, TaskStatus, TeamMember,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn timestamp(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

struct ProjectSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    status: ProjectStatus,
    due: (i32, u32, u32),
    progress: u8,
    client: &'static str,
    color: &'static str,
    team: [(&'static str, &'static str); 3],
}

const PROJECTS: [ProjectSeed; 4] = [
    ProjectSeed {
        id: "project-1",
        name: "PixelWave Corporate Portal",
        description: "Corporate site with a headless CMS, multi-language support and a client area.",
        status: ProjectStatus::Active,
        due: (2025, 2, 15),
        progress: 68,
        client: "PixelWave Studio",
        color: "#2563eb",
        team: [
            ("Mariana Lopes", "PM"),
            ("Lucas Nascimento", "Front-end Dev"),
            ("Carla Menezes", "UI/UX"),
        ],
    },
    ProjectSeed {
        id: "project-2",
        name: "Aurora Loyalty App",
        description: "Mobile app with gamification, CRM integration and segmented push notifications.",
        status: ProjectStatus::Planning,
        due: (2025, 3, 5),
        progress: 32,
        client: "Aurora Apps",
        color: "#0ea5e9",
        team: [
            ("Gabriela Souza", "PM"),
            ("Joao Henrique", "Mobile Dev"),
            ("Paula Martins", "UX Research"),
        ],
    },
    ProjectSeed {
        id: "project-3",
        name: "GrowthSpark Launch",
        description: "Full-funnel marketing campaign with converting landing pages and nurture automations.",
        status: ProjectStatus::Active,
        due: (2025, 1, 30),
        progress: 82,
        client: "GrowthSpark Digital",
        color: "#f97316",
        team: [
            ("Bruno Lima", "PM"),
            ("Renata Alves", "Copywriter"),
            ("Diego Rocha", "Designer"),
        ],
    },
    ProjectSeed {
        id: "project-4",
        name: "UXFlow Design System",
        description: "Complete design system with tokens, a component library and guidelines.",
        status: ProjectStatus::Delivered,
        due: (2024, 12, 12),
        progress: 100,
        client: "UXFlow Agency",
        color: "#10b981",
        team: [
            ("Camila Rocha", "Lead Designer"),
            ("Felipe Torres", "UI"),
            ("Larissa Prado", "Front-end Dev"),
        ],
    },
];

pub fn sample_projects() -> Vec<Project> {
    PROJECTS
        .iter()
        .map(|seed| Project {
            id: ProjectId::from(seed.id),
            name: seed.name.to_string(),
            description: seed.description.to_string(),
            status: seed.status,
            due_date: Some(date(seed.due.0, seed.due.1, seed.due.2)),
            progress: seed.progress,
            client: seed.client.to_string(),
            owner: seed.team[0].0.to_string(),
            team: seed
                .team
                .iter()
                .map(|(name, role)| TeamMember::new(*name, *role))
                .collect(),
            color: seed.color.to_string(),
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn task(
    id: &str,
    title: &str,
    description: &str,
    project: &str,
    owner: &str,
    due: NaiveDate,
    status: TaskStatus,
    priority: TaskPriority,
    tags: &[&str],
    checklist: &[(&str, bool)],
) -> Task {
    let id = TaskId::from(id);
    let checklist = checklist
        .iter()
        .enumerate()
        .map(|(index, (label, completed))| ChecklistItem {
            id: ChecklistItem::derived_id(&id, index, label),
            label: label.to_string(),
            completed: *completed,
        })
        .collect();

    Task {
        id,
        title: title.to_string(),
        description: description.to_string(),
        project_id: ProjectId::from(project),
        owner: owner.to_string(),
        due_date: due,
        status,
        priority,
        tags: strings(tags),
        checklist,
    }
}

pub fn sample_tasks() -> Vec<Task> {
    vec![
        task(
            "task-1",
            "Refine brief with client",
            "Collect kick-off meeting feedback and update the brief.",
            "project-1",
            "Mariana Lopes",
            date(2025, 1, 16),
            TaskStatus::InProgress,
            TaskPriority::High,
            &["Meeting", "Planning"],
            &[("Update shared document", true), ("Validate with client", false)],
        ),
        task(
            "task-2",
            "Mobile prototype",
            "Build clickable prototypes for the main app screens.",
            "project-2",
            "Paula Martins",
            date(2025, 1, 18),
            TaskStatus::Review,
            TaskPriority::Medium,
            &["Figma", "UX"],
            &[
                ("Onboarding flow", true),
                ("Challenges screen", false),
                ("Rewards screen", false),
            ],
        ),
        task(
            "task-3",
            "Configure backend environment",
            "Create the project and configure authentication and the document store.",
            "project-2",
            "Joao Henrique",
            date(2025, 1, 19),
            TaskStatus::Todo,
            TaskPriority::High,
            &["Backend", "Setup"],
            &[
                ("Create project", true),
                ("Configure auth", false),
                ("Create initial collections", false),
            ],
        ),
        task(
            "task-4",
            "Launch landing page",
            "Build a responsive landing page with testimonials and a dynamic call to action.",
            "project-3",
            "Diego Rocha",
            date(2025, 1, 14),
            TaskStatus::InProgress,
            TaskPriority::High,
            &["Next.js", "Design"],
            &[("Desktop layout", true), ("Mobile version", false)],
        ),
        task(
            "task-5",
            "Nurture automation flow",
            "Configure post-download nurture automation with conditional segments.",
            "project-3",
            "Renata Alves",
            date(2025, 1, 13),
            TaskStatus::Done,
            TaskPriority::Medium,
            &["Automation", "Email"],
            &[("Write emails", true), ("Configure segments", true)],
        ),
        task(
            "task-6",
            "Retrospective meeting",
            "Review design system deliveries and collect team learnings.",
            "project-4",
            "Camila Rocha",
            date(2025, 1, 10),
            TaskStatus::Done,
            TaskPriority::Low,
            &["Retrospective"],
            &[("Prepare agenda", true), ("Document insights", true)],
        ),
        task(
            "task-7",
            "Analytics setup",
            "Integrate GA4 and custom events into the corporate portal.",
            "project-1",
            "Lucas Nascimento",
            date(2025, 1, 22),
            TaskStatus::Todo,
            TaskPriority::Medium,
            &["Analytics"],
            &[("Map events", false), ("Configure tag manager", false)],
        ),
    ]
}

pub fn sample_clients() -> Vec<Client> {
    let seeds = [
        ("client-1", "Ana Ribeiro", "PixelWave Studio", "ana@pixelwave.example", ClientStatus::Active, "Design", &["deal-1", "deal-5"][..]),
        ("client-2", "Rafael Costa", "Aurora Apps", "rafael@aurora.example", ClientStatus::Active, "Mobile", &["deal-2", "deal-6"][..]),
        ("client-3", "Beatriz Nunes", "GrowthSpark Digital", "beatriz@growthspark.example", ClientStatus::Potential, "Marketing", &["deal-3", "deal-7"][..]),
        ("client-4", "Thiago Prates", "UXFlow Agency", "thiago@uxflow.example", ClientStatus::Inactive, "Consulting", &["deal-4", "deal-8"][..]),
    ];

    seeds
        .iter()
        .enumerate()
        .map(|(index, (id, name, company, email, status, industry, deals))| Client {
            id: ClientId::from(*id),
            name: name.to_string(),
            company: company.to_string(),
            email: email.to_string(),
            phone: format!("+55 11 9000-00{:02}", index + 1),
            status: *status,
            deals: deals.iter().map(|deal| DealId::from(*deal)).collect(),
            created_at: timestamp(2024, 6 + index as u32, 1),
            industry: Some(industry.to_string()),
            notes: None,
        })
        .collect()
}

pub fn sample_deals() -> Vec<Deal> {
    let seeds = [
        ("deal-1", "Portal redesign", "client-1", 48_000.0, DealStage::Proposal, "Mariana Lopes", 60, &["web", "cms"][..], Some(date(2025, 2, 10))),
        ("deal-2", "Loyalty app build", "client-2", 120_000.0, DealStage::Negotiation, "Gabriela Souza", 75, &["mobile"][..], Some(date(2025, 3, 1))),
        ("deal-3", "Launch campaign", "client-3", 35_000.0, DealStage::Won, "Bruno Lima", 100, &["marketing"][..], None),
        ("deal-4", "Design system support", "client-4", 18_000.0, DealStage::Lost, "Camila Rocha", 0, &["retainer"][..], None),
        ("deal-5", "Analytics retainer", "client-1", 12_000.0, DealStage::Prospecting, "Lucas Nascimento", 20, &["analytics"][..], None),
        ("deal-6", "Push campaign add-on", "client-2", 9_500.0, DealStage::Qualification, "Paula Martins", 40, &["mobile", "upsell"][..], Some(date(2025, 2, 20))),
        ("deal-7", "SEO audit", "client-3", 7_000.0, DealStage::Prospecting, "Renata Alves", 15, &["seo"][..], None),
        ("deal-8", "Component library training", "client-4", 5_000.0, DealStage::Qualification, "Felipe Torres", 30, &["training"][..], None),
    ];

    seeds
        .iter()
        .enumerate()
        .map(|(index, (id, title, client, value, stage, owner, probability, tags, due))| Deal {
            id: DealId::from(*id),
            title: title.to_string(),
            client_id: ClientId::from(*client),
            value: *value,
            stage: *stage,
            owner: owner.to_string(),
            probability: *probability,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            updated_at: timestamp(2025, 1, 2 + index as u32),
            due_date: *due,
            description: None,
        })
        .collect()
}
