//! Output generation for the daily post.
//!
//! # Submodules
//!
//! - [`markdown`]: Renders articles and cached cover paths into a post document
//! - [`post`]: Writes the rendered document under the posts directory
//!
//! # Output Structure
//!
//! ```text
//! source/
//! ├── _posts/
//! │   └── 2024-05-01-daily-news.md
//! └── images/
//!     ├── 2024-05-01-img0.png
//!     └── 2024-05-01-img1.jpg
//! ```

pub mod markdown;
pub mod post;
