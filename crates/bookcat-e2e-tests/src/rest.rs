use anyhow::Result;
use reqwest::Url;
use serde_json::json;
use tracing::info;

pub async fn create_book(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    author: &str,
    genre: &str,
    price: &str,
    publish_date: &str,
) -> Result<serde_json::Value> {
    let payload = json!({
        "title": title,
        "author": author,
        "genre": genre,
        "price": price,
        "publishDate": publish_date,
    });
    let api_url = base_url.join("books")?;

    let response = client.put(api_url).json(&payload).send().await?;
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    assert!(response.status().as_u16() == 201);

    let new_book: serde_json::Value = response.json().await?;
    Ok(new_book)
}
