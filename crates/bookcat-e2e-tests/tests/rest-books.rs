use bookcat_e2e_tests::{client_with_roles, launch_env, prepare_env, rest::create_book};
use bookcat_types::claim::Role;
use serde_json::json;
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_create_and_list() {
    let (args, _config_guard) = prepare_env("test_create_and_list").unwrap();
    let base_url = launch_env(args).await.unwrap();

    let editor = client_with_roles([Role::Editor]).unwrap();
    let api_url = base_url.join("books").unwrap();

    let payload = json!({
        "author": "Ursula K. Le Guin",
        "title": "The Dispossessed",
        "genre": "Science Fiction",
        "price": "19.99",
        "publishDate": "2022-01-01",
    });
    let response = editor
        .put(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 201);
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    // Location is resolved against the configured base URL
    assert_eq!(
        location,
        base_url.join("books/id/B-1").unwrap().to_string()
    );

    let book: serde_json::Value = response.json().await.unwrap();
    assert_eq!(book.get("id").unwrap().as_str().unwrap(), "B-1");
    assert_eq!(book.get("price").unwrap().as_f64().unwrap(), 19.99);
    assert_eq!(
        book.get("publishDate").unwrap().as_str().unwrap(),
        "2022-01-01"
    );
    // description was not sent
    assert!(book.get("description").unwrap().is_null());

    let second = create_book(
        &editor,
        &base_url,
        "Solaris",
        "Stanislaw Lem",
        "Science Fiction",
        "9.99",
        "1961-06-15",
    )
    .await
    .unwrap();
    assert_eq!(second.get("id").unwrap().as_str().unwrap(), "B-2");

    // listing is public and ordered by id
    let client = reqwest::Client::new();
    let response = client.get(api_url.clone()).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let books: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].get("id").unwrap().as_str().unwrap(), "B-1");
    assert_eq!(books[1].get("id").unwrap().as_str().unwrap(), "B-2");

    let response = client
        .get(base_url.join("books/id/B-1").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let books: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(
        books[0].get("title").unwrap().as_str().unwrap(),
        "The Dispossessed"
    );
}

#[tokio::test]
#[traced_test]
async fn test_mutations_require_editor() {
    let (args, _config_guard) = prepare_env("test_mutations_require_editor").unwrap();
    let base_url = launch_env(args).await.unwrap();

    let api_url = base_url.join("books").unwrap();
    let payload = json!({
        "title": "Solaris",
        "price": "9.99",
        "publishDate": "1961-06-15",
    });

    let anonymous = reqwest::Client::new();
    let response = anonymous
        .put(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let reader = client_with_roles([Role::Reader]).unwrap();
    let response = reader
        .put(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = anonymous
        .post(base_url.join("books/B-1").unwrap())
        .json(&json!({"price": "1.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    // reads stay public
    let response = anonymous.get(api_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
#[traced_test]
async fn test_validation_messages() {
    let (args, _config_guard) = prepare_env("test_validation_messages").unwrap();
    let base_url = launch_env(args).await.unwrap();

    let editor = client_with_roles([Role::Editor]).unwrap();
    let api_url = base_url.join("books").unwrap();

    let payload = json!({
        "title": "Broken",
        "price": "cheap",
        "publishDate": "soon",
    });
    let response = editor
        .put(api_url.clone())
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body.get("message").unwrap().as_str().unwrap();
    assert!(message.contains("The provided price is not valid"));
    assert!(message.contains("The provided date is not valid"));

    let payload = json!({
        "title": "Cheapskate",
        "price": "-5",
        "publishDate": "2022-01-01",
    });
    let response = editor.put(api_url).json(&payload).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body.get("message").unwrap().as_str().unwrap();
    assert!(message.contains("greater than or equal to zero"));
}

#[tokio::test]
#[traced_test]
async fn test_filters() {
    let (args, _config_guard) = prepare_env("test_filters").unwrap();
    let base_url = launch_env(args).await.unwrap();

    let editor = client_with_roles([Role::Editor]).unwrap();
    let books = [
        (
            "The Dispossessed",
            "Ursula K. Le Guin",
            "Science Fiction",
            "10.00",
            "1974-05-01",
        ),
        (
            "Solaris",
            "Stanislaw Lem",
            "Science Fiction",
            "20.00",
            "1961-06-15",
        ),
        ("The Big Sleep", "Raymond Chandler", "Crime", "30.00", "1939-02-06"),
    ];
    for (title, author, genre, price, published) in books {
        create_book(&editor, &base_url, title, author, genre, price, published)
            .await
            .unwrap();
    }

    let client = reqwest::Client::new();

    // substring, case-insensitive
    let response = client
        .get(base_url.join("books/author/LE").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let found: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(
        found[0].get("author").unwrap().as_str().unwrap(),
        "Stanislaw Lem"
    );

    // no match is 204, not an empty array
    let response = client
        .get(base_url.join("books/author/zzz").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // inclusive price range
    let mut price_url = base_url.join("books/price").unwrap();
    price_url.set_query(Some("minPrice=10&maxPrice=25"));
    let response = client.get(price_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let found: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].get("id").unwrap().as_str().unwrap(), "B-1");
    assert_eq!(found[1].get("id").unwrap().as_str().unwrap(), "B-2");

    // single bound means exact match
    let mut price_url = base_url.join("books/price").unwrap();
    price_url.set_query(Some("minPrice=20"));
    let response = client.get(price_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let found: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("title").unwrap().as_str().unwrap(), "Solaris");

    // inverted bounds are rejected
    let mut price_url = base_url.join("books/price").unwrap();
    price_url.set_query(Some("minPrice=30&maxPrice=10"));
    let response = client.get(price_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // non-numeric bounds get the same JSON error shape as other 400s
    let mut price_url = base_url.join("books/price").unwrap();
    price_url.set_query(Some("minPrice=abc"));
    let response = client.get(price_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    let message = body.get("message").unwrap().as_str().unwrap();
    assert!(message.starts_with("Invalid query"));

    // publish date by year, month and day
    let response = client
        .get(base_url.join("books/published/1961").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let found: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("title").unwrap().as_str().unwrap(), "Solaris");

    let response = client
        .get(base_url.join("books/published/1961/6").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(base_url.join("books/published/1961/6/15").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(base_url.join("books/published/1999").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    // a year is required
    let response = client
        .get(base_url.join("books/published").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // invalid month
    let response = client
        .get(base_url.join("books/published/1961/13").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[traced_test]
async fn test_update() {
    let (args, _config_guard) = prepare_env("test_update").unwrap();
    let base_url = launch_env(args).await.unwrap();

    let editor = client_with_roles([Role::Editor]).unwrap();
    create_book(
        &editor,
        &base_url,
        "Solaris",
        "Stanislaw Lem",
        "Science Fiction",
        "9.99",
        "1961-06-15",
    )
    .await
    .unwrap();

    let response = editor
        .post(base_url.join("books/B-1").unwrap())
        .json(&json!({"price": "25.50"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let book: serde_json::Value = response.json().await.unwrap();
    assert_eq!(book.get("price").unwrap().as_f64().unwrap(), 25.5);
    // untouched fields survive the patch
    assert_eq!(book.get("title").unwrap().as_str().unwrap(), "Solaris");
    assert_eq!(
        book.get("publishDate").unwrap().as_str().unwrap(),
        "1961-06-15"
    );

    let response = editor
        .post(base_url.join("books/B-99").unwrap())
        .json(&json!({"price": "1.00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = editor
        .post(base_url.join("books/B-1").unwrap())
        .json(&json!({"publishDate": "junk"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}
