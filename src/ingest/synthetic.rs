//! Synthetic engagement data.
//!
//! Generates a class of students with style-biased event histories:
//! - Samplers: 4-6 events, never the same category twice in a row
//! - Specialists: 5-8 events, 80% in one focus category
//! - Super-connectors: 7-11 events, one of every category first
//! - Selectives: 3-5 events in one or two categories
//!
//! The first `pattern_count` students are biased towards the school colors
//! (athletic every third, academic otherwise) so the silhouette reads as
//! blue and red.

use rand::Rng;
use rand::seq::SliceRandom;

use super::DataConfig;
use crate::model::{Category, EngagementStyle, Entity, Event};

const EVENT_NAMES: [(Category, [&str; 9]); 5] = [
    (
        Category::Academic,
        [
            "Research Symposium",
            "Study Group",
            "Department Lecture",
            "Academic Conference",
            "Thesis Workshop",
            "Library Workshop",
            "Exam Prep Session",
            "Faculty Mixer",
            "Honors Presentation",
        ],
    ),
    (
        Category::Social,
        [
            "Campus Club Fair",
            "Residence Hall Social",
            "Student Government",
            "Campus Event Planning",
            "Spring Festival",
            "Community Service",
            "Student Mixer",
            "Campus Tour Guide",
            "Social Club Meeting",
        ],
    ),
    (
        Category::Professional,
        [
            "Career Workshop",
            "Leadership Summit",
            "Industry Panel",
            "Networking Event",
            "Mock Interviews",
            "Career Fair",
            "Business Case Competition",
            "Alumni Networking",
            "Internship Seminar",
        ],
    ),
    (
        Category::Cultural,
        [
            "International Festival",
            "Arts Exhibition",
            "Theater Production",
            "Music Ensemble",
            "Concert Performance",
            "Cultural Celebration",
            "Diversity Workshop",
            "Film Screening",
            "Museum Visit",
        ],
    ),
    (
        Category::Athletic,
        [
            "Intramural Sports",
            "Varsity Game",
            "Team Training",
            "Championship Game",
            "Rally Event",
            "Sports Club",
            "Fitness Class",
            "Athletic Fundraiser",
            "Spirit Day",
        ],
    ),
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Student id for the `index`-th generated student.
pub fn student_id(class_year: u32, index: usize) -> String {
    format!("SMU{class_year}{:03}", index + 1)
}

/// Generate `config.entity_count` students; the first `pattern_count` get a
/// school-color focus category.
pub fn generate<R: Rng + ?Sized>(
    config: &DataConfig,
    pattern_count: usize,
    rng: &mut R,
) -> Vec<Entity> {
    let entities: Vec<Entity> = (0..config.entity_count)
        .map(|i| {
            let style = EngagementStyle::ALL[rng.gen_range(0..EngagementStyle::ALL.len())];
            let focus = if i < pattern_count {
                if i % 3 == 0 { Category::Athletic } else { Category::Academic }
            } else {
                Category::GENERATED[rng.gen_range(0..Category::GENERATED.len())]
            };
            student(student_id(config.class_year, i), style, focus, config.months, &mut *rng)
        })
        .collect();

    log::info!("Generated {} synthetic students", entities.len());
    entities
}

/// One student with a style-biased event history around `focus`.
pub fn student<R: Rng + ?Sized>(
    id: String,
    style: EngagementStyle,
    focus: Category,
    months: u8,
    rng: &mut R,
) -> Entity {
    let event_count = match style {
        EngagementStyle::Sampler => rng.gen_range(4..=6),
        EngagementStyle::Specialist => rng.gen_range(5..=8),
        EngagementStyle::SuperConnector => rng.gen_range(7..=11),
        EngagementStyle::Selective => rng.gen_range(3..=5),
    };

    let mut counts = [0u32; Category::COUNT];
    let mut events = Vec::with_capacity(event_count);
    let mut previous: Option<Category> = None;

    for i in 0..event_count {
        let category = match style {
            EngagementStyle::Specialist => {
                if rng.gen_bool(0.8) {
                    focus
                } else {
                    random_category(rng)
                }
            }
            EngagementStyle::Sampler => loop {
                let c = random_category(rng);
                if Some(c) != previous {
                    break c;
                }
            },
            EngagementStyle::SuperConnector => {
                let missing = Category::GENERATED.iter().copied().find(|c| counts[c.index()] == 0);
                match missing {
                    Some(c) if i < Category::GENERATED.len() => c,
                    _ => random_category(rng),
                }
            }
            EngagementStyle::Selective => {
                if i == 0 {
                    focus
                } else if i == 1 && rng.gen_bool(0.5) {
                    let others: Vec<Category> = Category::GENERATED
                        .iter()
                        .copied()
                        .filter(|&c| c != focus)
                        .collect();
                    others.choose(rng).copied().unwrap_or(focus)
                } else {
                    let seen: Vec<Category> = Category::GENERATED
                        .iter()
                        .copied()
                        .filter(|c| counts[c.index()] > 0)
                        .collect();
                    seen.choose(rng).copied().unwrap_or(focus)
                }
            }
        };

        counts[category.index()] += 1;
        previous = Some(category);
        let month = rng.gen_range(1..=months.max(1));
        events.push(Event::new(month, category, event_name(category, month, rng)));
    }

    Entity::with_events(id, style, events)
}

fn random_category<R: Rng + ?Sized>(rng: &mut R) -> Category {
    Category::GENERATED[rng.gen_range(0..Category::GENERATED.len())]
}

/// A plausible event name such as `"Career Fair (March)"`.
fn event_name<R: Rng + ?Sized>(category: Category, month: u8, rng: &mut R) -> String {
    let names = EVENT_NAMES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, names)| names.as_slice())
        .unwrap_or(&[]);
    let name = names.choose(rng).copied().unwrap_or("Campus Event");
    let month_name = MONTH_NAMES
        .get(usize::from(month).saturating_sub(1))
        .copied()
        .unwrap_or("Summer");
    format!("{name} ({month_name})")
}
