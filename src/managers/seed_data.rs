//! First-run sample data.
//!
//! A fresh store starts with two workspaces, five collections and a handful of
//! bookmarks so the views have something to render before the user adds
//! their own links.

use chrono::NaiveDate;

use crate::types::bookmark::{Bookmark, BookmarkStatus};
use crate::types::workspace::{Collection, Workspace};

/// Collection used by `add_bookmark` when nothing better can be resolved.
pub const DEFAULT_COLLECTION_ID: &str = "reading";

/// Workspace selected on first run.
pub const DEFAULT_WORKSPACE_ID: &str = "personal";

pub fn workspaces() -> Vec<Workspace> {
    vec![
        workspace("personal", "Personal", "user", 0, "blue"),
        workspace("work", "Work", "briefcase", 1, "violet"),
    ]
}

pub fn collections() -> Vec<Collection> {
    vec![
        collection("design", "work", "Design Resources", "palette"),
        collection("dev", "work", "Development", "code"),
        collection("tools", "work", "Tools", "wrench"),
        collection("reading", "personal", "Reading List", "book-open"),
        collection("inspiration", "personal", "Inspiration", "sparkles"),
    ]
}

pub fn bookmarks() -> Vec<Bookmark> {
    vec![
        bookmark(
            "1",
            "Shadcn UI",
            "https://ui.shadcn.com",
            "Beautifully designed components built with Radix UI and Tailwind CSS.",
            "code",
            "dev",
            (2024, 1, 15),
            true,
        ),
        bookmark(
            "2",
            "Vercel",
            "https://vercel.com",
            "Develop. Preview. Ship. The best frontend developer experience.",
            "code",
            "dev",
            (2024, 1, 14),
            true,
        ),
        bookmark(
            "4",
            "Figma",
            "https://figma.com",
            "The collaborative interface design tool.",
            "image",
            "design",
            (2024, 1, 12),
            true,
        ),
        bookmark(
            "11",
            "Linear",
            "https://linear.app",
            "The issue tracking tool you'll enjoy using.",
            "briefcase",
            "tools",
            (2024, 1, 5),
            true,
        ),
        bookmark(
            "13",
            "Awwwards",
            "https://awwwards.com",
            "Website awards recognizing talent and effort in web design.",
            "image",
            "inspiration",
            (2024, 1, 3),
            false,
        ),
        bookmark(
            "14",
            "Frontend Masters",
            "https://frontendmasters.com",
            "Advance your skills with in-depth, modern front-end engineering courses.",
            "book",
            "reading",
            (2024, 1, 2),
            false,
        ),
        bookmark(
            "15",
            "CSS Tricks",
            "https://css-tricks.com",
            "Tips, tricks and techniques on using CSS.",
            "book",
            "reading",
            (2024, 1, 1),
            false,
        ),
    ]
}

fn workspace(id: &str, name: &str, icon: &str, order_index: u32, color: &str) -> Workspace {
    Workspace {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        order_index,
        color: color.to_string(),
    }
}

fn collection(id: &str, workspace_id: &str, name: &str, icon: &str) -> Collection {
    Collection {
        id: id.to_string(),
        workspace_id: workspace_id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn bookmark(
    id: &str,
    title: &str,
    url: &str,
    description: &str,
    favicon: &str,
    collection_id: &str,
    (year, month, day): (i32, u32, u32),
    is_favorite: bool,
) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        description: description.to_string(),
        favicon: favicon.to_string(),
        collection_id: collection_id.to_string(),
        created_at: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        is_favorite,
        has_dark_icon: Some(true),
        status: BookmarkStatus::Active,
    }
}
