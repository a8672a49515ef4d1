use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

/// One message of a discussion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub discussion_id: u64,
    pub post_id: u64,
    pub title: String,
    pub author: String,
    /// Body converted to Markdown.
    pub content: String,
    pub created_at: DateTime<FixedOffset>,
    /// Id of the post this one replies to, within the same discussion.
    /// `None` for the discussion's root post.
    pub responds_to: Option<u64>,
}

impl Post {
    /// A post seen for the first time, before its block has been read.
    #[must_use]
    pub fn placeholder(discussion_id: u64, post_id: u64) -> Self {
        Self {
            discussion_id,
            post_id,
            title: String::new(),
            author: String::new(),
            content: String::new(),
            created_at: Utc::now().fixed_offset(),
            responds_to: None,
        }
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.responds_to.is_none()
    }

    /// Name of the Markdown file this post is exported to.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "discussion_{}_post_{}.md",
            self.discussion_id, self.post_id
        )
    }

    /// Markdown document: title heading, byline, a rule as wide as the
    /// longer of the two, then the body.
    #[must_use]
    pub fn render(&self) -> String {
        let created_at = format_date(&self.created_at);
        let byline = format!("par {}, {created_at}", self.author);
        let width = (self.title.chars().count() + 2)
            .max(3 + self.author.chars().count() + 2 + created_at.chars().count())
            + 2;

        [
            format!("# {}", self.title),
            byline,
            "-".repeat(width),
            self.content.clone(),
        ]
        .join("\n")
    }
}

fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Post id={} discussion_id={} author={} created_at={}>",
            self.post_id,
            self.discussion_id,
            self.author,
            format_date(&self.created_at)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Post {
        Post {
            discussion_id: 42,
            post_id: 7,
            title: "Hello".to_string(),
            author: "Alice".to_string(),
            content: "World".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-03-01T09:30:00+01:00").unwrap(),
            responds_to: None,
        }
    }

    #[test]
    fn test_render() {
        let rendered = sample().render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "# Hello");
        assert_eq!(lines[1], "par Alice, 2024-03-01 09:30:00+01:00");
        // byline: 3 + 5 + 2 + 25, wider than the title
        assert_eq!(lines[2], "-".repeat(37));
        assert_eq!(lines[3], "World");
    }

    #[test]
    fn test_rule_follows_long_title() {
        let post = Post {
            title: "A".repeat(60),
            ..sample()
        };
        let rendered = post.render();
        assert_eq!(rendered.lines().nth(2).unwrap().len(), 64);
    }

    #[test]
    fn test_rule_counts_characters() {
        let post = Post {
            author: "Éloïse".to_string(),
            ..sample()
        };
        let rendered = post.render();
        assert_eq!(rendered.lines().nth(2).unwrap().len(), 3 + 6 + 2 + 25 + 2);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(sample().file_name(), "discussion_42_post_7.md");
    }
}
