//! Comment listing and creation scoped to one article.

use std::sync::Arc;

use serde_json::{Value, json};
use sobremesa::application::articles::ArticleDraft;
use sobremesa::application::comments::CommentError;
use sobremesa::application::context::Console;
use sobremesa::application::store::{Document, DocumentStore};
use sobremesa::domain::entities::UserDraft;
use sobremesa::domain::types::EntityId;
use sobremesa::domain::views::UNKNOWN_AUTHOR;
use sobremesa::infra::MemoryStore;

fn document(value: Value) -> Document {
    let Value::Object(map) = value else {
        panic!("literal is not an object");
    };
    map
}

async fn console_with_article() -> (Arc<MemoryStore>, Console, EntityId, EntityId) {
    let memory = Arc::new(MemoryStore::new());
    let console = Console::connect(memory.clone())
        .await
        .expect("embedded store is always reachable");

    let author = console
        .users()
        .create_one(&UserDraft::new("ana@example.com", "Ana", "migas"))
        .await
        .expect("create user");
    let article = console
        .articles()
        .create_article(&ArticleDraft {
            title: "Tarta".to_string(),
            text: "Receta de tarta de queso.".to_string(),
            author_key: "ana@example.com".to_string(),
            category_ids: Vec::new(),
            tag_ids: Vec::new(),
        })
        .await
        .expect("create article");

    (memory, console, article, author)
}

#[tokio::test]
async fn an_article_without_comments_lists_nothing() {
    let (_memory, console, article, _author) = console_with_article().await;

    let comments = console
        .comments()
        .list_for_article(article)
        .await
        .expect("list comments");
    assert!(comments.is_empty());
}

#[tokio::test]
async fn created_comments_come_back_with_their_author_joined() {
    let (_memory, console, article, author) = console_with_article().await;

    console
        .comments()
        .create(article, author, "¡Qué rica!")
        .await
        .expect("create comment");

    let comments = console
        .comments()
        .list_for_article(article)
        .await
        .expect("list comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "¡Qué rica!");
    assert_eq!(comments[0].author_display(), "Ana");
}

#[tokio::test]
async fn blank_comment_text_is_rejected() {
    let (_memory, console, article, author) = console_with_article().await;

    let result = console.comments().create(article, author, "   ").await;
    assert!(matches!(result, Err(CommentError::EmptyText)));
}

#[tokio::test]
async fn a_dangling_comment_author_renders_the_unknown_placeholder() {
    let (_memory, console, article, author) = console_with_article().await;

    console
        .comments()
        .create(article, author, "Primera")
        .await
        .expect("create comment");
    console
        .users()
        .delete_one(author)
        .await
        .expect("delete user");

    let comments = console
        .comments()
        .list_for_article(article)
        .await
        .expect("list comments");
    assert_eq!(comments.len(), 1);
    assert!(comments[0].author.is_none());
    assert_eq!(comments[0].author_display(), UNKNOWN_AUTHOR);
}

#[tokio::test]
async fn comments_are_listed_in_chronological_order() {
    let (memory, console, article, author) = console_with_article().await;

    // Insert out of order with explicit dates; the service must sort by
    // date ascending rather than trust the store's natural order.
    for (text, date) in [
        ("tercera", "2024-03-01T09:00:00Z"),
        ("primera", "2024-01-01T09:00:00Z"),
        ("segunda", "2024-02-01T09:00:00Z"),
    ] {
        memory
            .insert_one(
                "comments",
                document(json!({
                    "article_id": article.to_string(),
                    "author_id": author.to_string(),
                    "text": text,
                    "date": date,
                })),
            )
            .await
            .expect("insert comment document");
    }

    let comments = console
        .comments()
        .list_for_article(article)
        .await
        .expect("list comments");
    let texts: Vec<&str> = comments.iter().map(|comment| comment.text.as_str()).collect();
    assert_eq!(texts, vec!["primera", "segunda", "tercera"]);
}

#[tokio::test]
async fn comments_are_scoped_to_their_article() {
    let (_memory, console, article, author) = console_with_article().await;

    let other_article = console
        .articles()
        .create_article(&ArticleDraft {
            title: "Caldo".to_string(),
            text: "Hervir a fuego lento.".to_string(),
            author_key: "ana@example.com".to_string(),
            category_ids: Vec::new(),
            tag_ids: Vec::new(),
        })
        .await
        .expect("create second article");

    console
        .comments()
        .create(article, author, "para la tarta")
        .await
        .expect("create comment");
    console
        .comments()
        .create(other_article, author, "para el caldo")
        .await
        .expect("create comment");

    let comments = console
        .comments()
        .list_for_article(other_article)
        .await
        .expect("list comments");
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "para el caldo");
}
