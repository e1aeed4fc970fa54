// Demo data for local databases. Writes straight to the store, so seeded
// content skips the classifier; the flagged post is stored already suppressed.

use crate::cli::context::AppContext;
use crate::core::moderation::{
    BoardDetail, ContentStore, ModerationError, NewUser, PostDraft, UserRole, UserStore,
};
use anyhow::Result;
use chrono::Utc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { users: usize, posts: usize },
    /// The database already had users; nothing was written.
    Skipped,
}

pub async fn seed_demo_data<S>(store: &S) -> Result<SeedOutcome, ModerationError>
where
    S: UserStore + ContentStore,
{
    if store.count_users().await? > 0 {
        return Ok(SeedOutcome::Skipped);
    }

    let users = [
        ("student1", UserRole::Student, Some(1), false),
        ("senior1", UserRole::Student, Some(2), true),
        ("senior2", UserRole::Student, Some(3), true),
        ("admin", UserRole::Admin, None, false),
    ];
    let mut created = Vec::with_capacity(users.len());
    for (username, role, grade, is_senior_verified) in users {
        created.push(
            store
                .insert_user(NewUser {
                    username: username.to_string(),
                    role,
                    grade,
                    is_senior_verified,
                })
                .await?,
        );
    }
    let student = &created[0];

    let posts = [
        ("Hello everyone", "This is my first post", BoardDetail::Talk, false),
        (
            "Math question",
            "How do I solve quadratic equations?",
            BoardDetail::Question {
                category_name: "math".to_string(),
                for_seniors_only: false,
            },
            false,
        ),
        ("Test", "you absolute idiot", BoardDetail::Talk, true),
    ];
    let post_count = posts.len();
    for (title, body, board, is_bad) in posts {
        store
            .insert_post(PostDraft {
                author_id: student.id,
                title: title.to_string(),
                body: body.to_string(),
                board,
                is_bad,
                created_at: Utc::now(),
            })
            .await?;
    }

    Ok(SeedOutcome::Seeded {
        users: created.len(),
        posts: post_count,
    })
}

pub async fn execute(ctx: &AppContext) -> Result<()> {
    match seed_demo_data(ctx.store.as_ref()).await? {
        SeedOutcome::Seeded { users, posts } => {
            tracing::info!(users, posts, "Seeded demo data");
            println!("Seeded {} users and {} posts.", users, posts);
        }
        SeedOutcome::Skipped => {
            println!("Users already exist; skipping seed.");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::community::InMemoryCommunityStore;

    #[tokio::test]
    async fn test_seed_creates_demo_accounts_once() {
        let store = InMemoryCommunityStore::new();

        let first = seed_demo_data(&store).await.unwrap();
        let second = seed_demo_data(&store).await.unwrap();

        assert_eq!(first, SeedOutcome::Seeded { users: 4, posts: 3 });
        assert_eq!(second, SeedOutcome::Skipped);
        assert_eq!(store.count_users().await.unwrap(), 4);

        let flagged = store.flagged_posts().await.unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].title, "Test");
    }

    #[tokio::test]
    async fn test_seeded_seniors_are_verified() {
        let store = InMemoryCommunityStore::new();
        seed_demo_data(&store).await.unwrap();

        let mut seniors = 0;
        for id in 1..=4 {
            let user = store.get_user(id).await.unwrap().unwrap();
            if user.is_senior_verified {
                seniors += 1;
                assert!(user.username.starts_with("senior"));
            }
        }
        assert_eq!(seniors, 2);
    }
}
