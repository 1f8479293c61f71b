use criterion::{criterion_group, criterion_main, Criterion};
use shelfwise::db::Seed;
use shelfwise::models::{Book, BusinessPlan, Bookmark, ContentRef, User, UserLibrary};
use shelfwise::services::RecommendationService;
use std::hint::black_box;

const CATEGORIES: [&str; 6] = [
    "Self-Help",
    "Finance",
    "Business",
    "Productivity",
    "Psychology",
    "History",
];
const TAGS: [&str; 10] = [
    "habits", "money", "startup", "focus", "investing", "leadership", "mindset", "career",
    "negotiation", "innovation",
];

/// A catalog of `books` books and `plans` business plans with overlapping tags.
fn synthetic_catalog(books: u64, plans: u64) -> (Vec<Book>, Vec<BusinessPlan>) {
    let books = (1..=books)
        .map(|id| {
            let i = id as usize;
            serde_json::from_value(serde_json::json!({
                "id": id,
                "title": format!("Book {}", id),
                "author": format!("Author {}", i % 40),
                "category": CATEGORIES[i % CATEGORIES.len()],
                "description": "",
                "rating": (i % 50) as f32 / 10.0,
                "tags": [TAGS[i % TAGS.len()], TAGS[(i * 7) % TAGS.len()], TAGS[(i * 3) % TAGS.len()]],
            }))
            .expect("valid book")
        })
        .collect();

    let plans = (1..=plans)
        .map(|id| {
            let i = id as usize;
            serde_json::from_value(serde_json::json!({
                "id": id,
                "title": format!("Plan {}", id),
                "industry": CATEGORIES[i % CATEGORIES.len()],
                "description": "",
                "tags": [TAGS[i % TAGS.len()], TAGS[(i * 5) % TAGS.len()]],
            }))
            .expect("valid plan")
        })
        .collect();

    (books, plans)
}

fn benchmark_recommendations(c: &mut Criterion) {
    let seed = Seed::builtin().expect("Failed to load built-in catalog");
    let small = RecommendationService::from_catalog(&seed.books, &seed.business_plans);

    let (books, plans) = synthetic_catalog(2000, 300);
    let large = RecommendationService::from_catalog(&books, &plans);

    let user: User = serde_json::from_value(serde_json::json!({
        "id": 1,
        "name": "Bench Reader",
        "email": "bench@example.com",
        "preferred_categories": ["Finance"],
    }))
    .expect("valid user");
    let mut library = UserLibrary::default();
    for id in [3, 17, 256, 1024] {
        library.bookmarks.push(Bookmark {
            content: ContentRef::book(id),
            created_at: String::new(),
        });
    }

    let mut group = c.benchmark_group("recommendations");

    group.bench_function("similar_builtin_catalog", |b| {
        b.iter(|| small.similar_to(black_box(&ContentRef::book(1)), 5))
    });

    group.bench_function("similar_large_catalog", |b| {
        b.iter(|| large.similar_to(black_box(&ContentRef::book(42)), 10))
    });

    group.bench_function("for_user_large_catalog", |b| {
        b.iter(|| large.for_user(black_box(&user), black_box(&library), 10))
    });

    group.bench_function("build_index_large_catalog", |b| {
        b.iter(|| RecommendationService::from_catalog(black_box(&books), black_box(&plans)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_recommendations);
criterion_main!(benches);
