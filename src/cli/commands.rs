use crate::app::{AppContext, HeadlinerError, Result};
use crate::client::{PageFetch, PageRequest};
use crate::domain::ArticlePage;
use crate::reconciler::{PresentedArticle, Toggle};
use crate::session::FeedSession;

pub async fn latest(
    ctx: &AppContext,
    query: Option<String>,
    page: Option<String>,
    pages: usize,
) -> Result<()> {
    if let Some(cursor) = page {
        let fetched = fetch_one(ctx, query, Some(cursor.clone())).await?;
        print_page(&cursor, &fetched, &ctx.reconciler.present_current(&fetched));
        return Ok(());
    }

    let mut session = FeedSession::new(ctx.client.clone(), query);
    let first = session.load_first().await?;
    print_page("-", first, &ctx.reconciler.present_current(first));

    for _ in 1..pages {
        let cursor = match session.next_cursor() {
            Some(c) => c.to_string(),
            None => break,
        };
        match session.load_next().await? {
            Some(next) => print_page(&cursor, next, &ctx.reconciler.present_current(next)),
            None => break,
        }
    }

    match session.next_cursor() {
        Some(cursor) => println!("More: --page {}", cursor),
        None => println!("No more pages"),
    }
    Ok(())
}

pub fn list_favorites(ctx: &AppContext) {
    let snapshot = ctx.favorites.snapshot();

    if snapshot.is_empty() {
        println!("No favorites");
        return;
    }

    for record in snapshot.iter() {
        let author = record.creator.as_deref().unwrap_or("unknown");
        let image = if record.image.is_some() { " [img]" } else { "" };
        println!("{} - {} ({}){}", record.title, author, record.published_at, image);
        println!("    {}", record.link);
    }
}

pub async fn save(
    ctx: &AppContext,
    index: usize,
    query: Option<String>,
    page: Option<String>,
    with_image: bool,
) -> Result<()> {
    let fetched = fetch_one(ctx, query, page).await?;
    let len = fetched.articles.len();
    let article = index
        .checked_sub(1)
        .and_then(|i| fetched.articles.get(i))
        .ok_or(HeadlinerError::ArticleIndex { index, len })?;

    let image = match (&article.image_url, with_image) {
        (Some(url), true) => match ctx.client.fetch_image(url).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "saving without image");
                None
            }
        },
        _ => None,
    };

    match ctx.reconciler.toggle_favorite(article, false, image)? {
        Toggle::Added => println!("Saved: {}", article.title),
        _ => println!("Already a favorite: {}", article.title),
    }
    Ok(())
}

pub fn remove(ctx: &AppContext, key: &str) -> Result<()> {
    let record = ctx
        .favorites
        .find(key)?
        .ok_or_else(|| HeadlinerError::FavoriteNotFound(key.to_string()))?;

    ctx.favorites.remove_record(&record)?;
    println!("Removed: {}", record.title);
    Ok(())
}

pub fn clear(ctx: &AppContext) -> Result<()> {
    let removed = ctx.favorites.clear()?;
    println!("Removed {} favorites", removed);
    Ok(())
}

async fn fetch_one(
    ctx: &AppContext,
    query: Option<String>,
    cursor: Option<String>,
) -> Result<ArticlePage> {
    let request = PageRequest { query, cursor };
    match ctx.client.fetch_page(&request).await? {
        PageFetch::Page(page) => Ok(page),
        PageFetch::Skipped => Err(HeadlinerError::Other("a page fetch is already running".into())),
    }
}

fn print_page(cursor: &str, page: &ArticlePage, presented: &[PresentedArticle]) {
    println!("Page {} ({} results)", cursor, page.total_results);
    for (i, item) in presented.iter().enumerate() {
        let marker = if item.is_favorited { "*" } else { " " };
        let author = item.article.author().unwrap_or("unknown");
        println!(
            "{:>3}. [{}] {} - {} ({})",
            i + 1,
            marker,
            item.article.title,
            author,
            item.article.published_at
        );
    }
}
