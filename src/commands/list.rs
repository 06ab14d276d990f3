//! List site content

use anyhow::Result;

use crate::cms::FetchError;
use crate::config::ExecutionContext;
use crate::content::{ContentApi, Queries};
use crate::Blog;

/// Message shown instead of content when fetching fails
pub fn fallback_message(err: &FetchError) -> String {
    let hint = match err.status() {
        Some(401) | Some(403) => "Check that the API key is valid for this service.",
        Some(404) => "Check the service domain and the API endpoint names.",
        Some(_) => "microCMS returned an error. Try again later.",
        None => "Check network access and the proxy URL in _config.yml.",
    };
    format!(
        "Could not load content.\n  {}\n  Set MICROCMS_API_KEY and MICROCMS_SERVICE_DOMAIN (or the PUBLIC_ variants) in .env.\n  Details: {}",
        hint, err
    )
}

/// List site content by type
pub async fn run(
    blog: &Blog,
    content_type: &str,
    limit: usize,
    context: ExecutionContext,
) -> Result<()> {
    let api = blog.content_api(context)?;

    match list(&api, content_type, limit).await {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
        Err(ListError::Fetch(err)) => {
            println!("{}", fallback_message(&err));
            Err(err.into())
        }
        Err(ListError::UnknownType) => anyhow::bail!(
            "Unknown type: {}. Available: post, category, tag",
            content_type
        ),
    }
}

#[derive(Debug, thiserror::Error)]
enum ListError {
    #[error("unknown content type")]
    UnknownType,
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

async fn list(api: &ContentApi, content_type: &str, limit: usize) -> Result<Vec<String>, ListError> {
    let queries = Queries::new().limit(limit);
    let mut lines = Vec::new();

    match content_type {
        "post" | "posts" => {
            let posts = api
                .list_posts(Some(&queries.orders("-publishedAt")))
                .await?;
            lines.push(format!(
                "Posts ({} of {}):",
                posts.contents.len(),
                posts.total_count
            ));
            for post in posts.contents {
                lines.push(format!(
                    "  {} - {} [{}] ({})",
                    post.display_date().format("%Y-%m-%d"),
                    post.title,
                    post.category.name,
                    post.id
                ));
            }
        }
        "category" | "categories" => {
            let categories = api.list_categories(Some(&queries)).await?;
            lines.push(format!("Categories ({}):", categories.total_count));
            for category in categories.contents {
                lines.push(format!("  {} ({})", category.name, category.id));
            }
        }
        "tag" | "tags" => {
            let tags = api.list_tags(Some(&queries)).await?;
            lines.push(format!("Tags ({}):", tags.total_count));
            for tag in tags.contents {
                lines.push(format!("  {} ({})", tag.name, tag.id));
            }
        }
        _ => return Err(ListError::UnknownType),
    }

    Ok(lines)
}
