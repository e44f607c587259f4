//! Database seeder for Anggara development and testing.
//!
//! Seeds a default admin account, the current budget year, and a starter
//! APBD category tree (revenue, expenditure, financing).
//!
//! Usage: cargo run --bin seeder

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use anggara_core::auth::hash_password;
use anggara_core::category::CategoryKind;
use anggara_db::repositories::{
    AdminRepository, BudgetYearRepository, CategoryRepository, CreateBudgetYearInput,
    CreateCategoryInput,
};

const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = anggara_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding admin account...");
    seed_admin(&db).await;

    println!("Seeding budget year...");
    seed_budget_year(&db).await;

    println!("Seeding category tree...");
    seed_categories(&db).await;

    println!("Seeding complete!");
}

/// Seeds the default admin. Change the password after first login.
async fn seed_admin(db: &DatabaseConnection) {
    let repo = AdminRepository::new(db.clone());

    match repo.find_by_username(DEFAULT_ADMIN_USERNAME).await {
        Ok(Some(_)) => {
            println!("  Admin already exists, skipping...");
            return;
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Failed to check for existing admin: {e}");
            return;
        }
    }

    let password_hash = hash_password(DEFAULT_ADMIN_PASSWORD).expect("Failed to hash password");
    match repo
        .create(DEFAULT_ADMIN_USERNAME, &password_hash, "admin")
        .await
    {
        Ok(admin) => println!("  Created admin: {}", admin.username),
        Err(e) => eprintln!("Failed to insert admin: {e}"),
    }
}

/// Seeds the current fiscal year if absent.
async fn seed_budget_year(db: &DatabaseConnection) {
    let repo = BudgetYearRepository::new(db.clone());
    let year = 2026;

    match repo
        .create(CreateBudgetYearInput {
            year,
            regulation_number: None,
            enactment_date: None,
        })
        .await
    {
        Ok(created) => println!("  Created budget year {}", created.year),
        Err(anggara_db::repositories::BudgetYearError::DuplicateYear(_)) => {
            println!("  Budget year {year} already exists, skipping...");
        }
        Err(e) => eprintln!("Failed to insert budget year: {e}"),
    }
}

/// One branch of the seed tree: a level-1 root with its level-2 groups
/// and their level-3 leaves.
struct Branch {
    kind: CategoryKind,
    root: (&'static str, &'static str),
    groups: &'static [((&'static str, &'static str), &'static [(&'static str, &'static str)])],
}

const BRANCHES: &[Branch] = &[
    Branch {
        kind: CategoryKind::Revenue,
        root: ("Revenue", "4"),
        groups: &[
            (
                ("Own-Source Revenue", "4.1"),
                &[
                    ("Local Taxes", "4.1.1"),
                    ("Local Retributions", "4.1.2"),
                    ("Separated Regional Wealth Proceeds", "4.1.3"),
                ],
            ),
            (
                ("Transfer Revenue", "4.2"),
                &[
                    ("General Allocation Fund", "4.2.1"),
                    ("Special Allocation Fund", "4.2.2"),
                ],
            ),
        ],
    },
    Branch {
        kind: CategoryKind::Expenditure,
        root: ("Expenditure", "5"),
        groups: &[
            (
                ("Operational Expenditure", "5.1"),
                &[
                    ("Personnel Expenditure", "5.1.1"),
                    ("Goods and Services Expenditure", "5.1.2"),
                ],
            ),
            (
                ("Capital Expenditure", "5.2"),
                &[
                    ("Land and Buildings", "5.2.1"),
                    ("Machinery and Equipment", "5.2.2"),
                ],
            ),
        ],
    },
    Branch {
        kind: CategoryKind::Financing,
        root: ("Financing", "6"),
        groups: &[
            (
                ("Financing Receipts", "6.1"),
                &[("Prior-Year Budget Surplus", "6.1.1")],
            ),
            (
                ("Financing Disbursements", "6.2"),
                &[("Capital Participation", "6.2.1")],
            ),
        ],
    },
];

/// Seeds the starter category tree, skipping branches that already exist.
async fn seed_categories(db: &DatabaseConnection) {
    let repo = CategoryRepository::new(db.clone());

    for branch in BRANCHES {
        let root_id = match create_category(&repo, None, branch.kind, branch.root, 1).await {
            Some(id) => id,
            None => continue,
        };

        for (group, leaves) in branch.groups {
            let Some(group_id) = create_category(&repo, Some(root_id), branch.kind, *group, 2).await
            else {
                continue;
            };

            for leaf in *leaves {
                create_category(&repo, Some(group_id), branch.kind, *leaf, 3).await;
            }
        }
    }
}

async fn create_category(
    repo: &CategoryRepository,
    parent_id: Option<Uuid>,
    kind: CategoryKind,
    (name, code): (&str, &str),
    level: i16,
) -> Option<Uuid> {
    match repo
        .create(CreateCategoryInput {
            parent_id,
            kind,
            name: name.to_owned(),
            code: Some(code.to_owned()),
            level,
        })
        .await
    {
        Ok(category) => {
            println!("  Created category {code} {name}");
            Some(category.id)
        }
        Err(
            anggara_db::repositories::CategoryError::DuplicateName(_)
            | anggara_db::repositories::CategoryError::DuplicateCode(_),
        ) => {
            println!("  Category {name} already exists, skipping...");
            None
        }
        Err(e) => {
            eprintln!("Failed to insert category {name}: {e}");
            None
        }
    }
}
