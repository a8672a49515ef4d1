//! Integration tests for writing a forum tree to disk.

use chrono::{DateTime, TimeZone, Utc};
use moodle_forum_mirror::{Discussion, Forum, ForumError, Post};
use tempfile::TempDir;

fn post(discussion_id: u64, post_id: u64, responds_to: Option<u64>) -> Post {
    Post {
        title: "Hello".to_string(),
        author: "Alice".to_string(),
        content: "World".to_string(),
        created_at: DateTime::parse_from_rfc3339("2024-03-01T09:30:00+01:00").unwrap(),
        responds_to,
        ..Post::placeholder(discussion_id, post_id)
    }
}

fn forum_with(discussions: Vec<Discussion>) -> Forum {
    Forum {
        accessible: true,
        forum_name: Some("General".to_string()),
        discussions,
        ..Forum::new(5)
    }
}

fn discussion(discussion_id: u64, posts: Vec<Post>) -> Discussion {
    let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    Discussion {
        posts,
        ..Discussion::new(discussion_id, "Hello", "Alice", created_at)
    }
}

fn files_under(root: &std::path::Path) -> Vec<String> {
    let mut files = Vec::new();
    for dir in std::fs::read_dir(root).unwrap() {
        let dir = dir.unwrap().path();
        for file in std::fs::read_dir(&dir).unwrap() {
            let file = file.unwrap().path();
            files.push(
                file.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/"),
            );
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn test_single_post_layout_and_content() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let forum = forum_with(vec![discussion(42, vec![post(42, 7, None)])]);

    forum.save(&out).await.unwrap();

    assert_eq!(files_under(&out), vec!["42/discussion_42_post_7.md"]);
    let written = std::fs::read_to_string(out.join("42/discussion_42_post_7.md")).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "# Hello");
    assert!(lines[1].starts_with("par Alice, 2024-03-01"));
    assert!(!lines[2].is_empty());
    assert!(lines[2].chars().all(|c| c == '-'));
    assert!(written.trim_end().ends_with("World"));
}

#[tokio::test]
async fn test_every_post_gets_a_file() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let forum = forum_with(vec![
        discussion(1, vec![post(1, 10, None), post(1, 11, Some(10))]),
        discussion(2, vec![post(2, 20, None)]),
        discussion(3, Vec::new()),
    ]);

    forum.save(&out).await.unwrap();

    assert_eq!(
        files_under(&out),
        vec![
            "1/discussion_1_post_10.md",
            "1/discussion_1_post_11.md",
            "2/discussion_2_post_20.md",
        ]
    );
    assert!(out.join("3").is_dir());
}

#[tokio::test]
async fn test_inaccessible_forum_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let forum = Forum {
        accessible: false,
        ..forum_with(vec![discussion(42, vec![post(42, 7, None)])])
    };

    forum.save(&out).await.unwrap();

    assert!(!out.exists());
}

#[tokio::test]
async fn test_existing_file_blocks_output_directory() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    std::fs::write(&out, "not a directory").unwrap();
    let forum = forum_with(vec![discussion(42, vec![post(42, 7, None)])]);

    let result = forum.save(&out).await;

    assert!(
        matches!(result, Err(ForumError::NotADirectory(ref path)) if *path == out),
        "got {result:?}"
    );
}

#[tokio::test]
async fn test_saving_twice_overwrites() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("out");
    let mut forum = forum_with(vec![discussion(42, vec![post(42, 7, None)])]);
    forum.save(&out).await.unwrap();

    forum.discussions[0].posts[0].content = "Changed".to_string();
    forum.save(&out).await.unwrap();

    let written = std::fs::read_to_string(out.join("42/discussion_42_post_7.md")).unwrap();
    assert!(written.contains("Changed"));
    assert!(!written.contains("World"));
}

#[tokio::test]
async fn test_discussion_saves_into_given_directory() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("nested").join("42");
    let discussion = discussion(42, vec![post(42, 7, None), post(42, 8, Some(7))]);

    discussion.save(&target).await.unwrap();

    assert!(target.join("discussion_42_post_7.md").is_file());
    assert!(target.join("discussion_42_post_8.md").is_file());
}
