use clap::Parser;
use time::macros::date;
use tracing::info;

use bookcat_dal::book::{BookRepository, CreateBook};

use crate::commands::Executor;

#[derive(Parser, Debug)]
pub struct SeedCmd {
    #[arg(
        long,
        env = "BOOKCAT_DATABASE_URL",
        help = "Database URL e.g. sqlite://file.db"
    )]
    database_url: String,
}

fn sample_books() -> Vec<CreateBook> {
    fn book(
        title: &str,
        author: &str,
        genre: &str,
        description: &str,
        price: f64,
        publish_date: time::Date,
    ) -> CreateBook {
        CreateBook {
            author: Some(author.to_string()),
            description: Some(description.to_string()),
            title: Some(title.to_string()),
            genre: Some(genre.to_string()),
            price: Some(price),
            publish_date: Some(publish_date),
        }
    }

    vec![
        book(
            "The Dispossessed",
            "Ursula K. Le Guin",
            "Science Fiction",
            "A physicist from an anarchist moon travels to the capitalist home world.",
            12.99,
            date!(1974 - 05 - 01),
        ),
        book(
            "Solaris",
            "Stanislaw Lem",
            "Science Fiction",
            "A psychologist confronts an ocean that mirrors human memory.",
            9.99,
            date!(1961 - 06 - 15),
        ),
        book(
            "The Big Sleep",
            "Raymond Chandler",
            "Crime",
            "Philip Marlowe takes a blackmail case in Los Angeles.",
            7.50,
            date!(1939 - 02 - 06),
        ),
        book(
            "War with the Newts",
            "Karel Capek",
            "Satire",
            "Humanity discovers, exploits and is undone by intelligent newts.",
            11.25,
            date!(1936 - 01 - 01),
        ),
        book(
            "The Left Hand of Darkness",
            "Ursula K. Le Guin",
            "Science Fiction",
            "An envoy navigates politics on a planet without fixed gender.",
            10.00,
            date!(1969 - 03 - 01),
        ),
    ]
}

impl Executor for SeedCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = bookcat_dal::new_pool(&self.database_url).await?;
        bookcat_dal::MIGRATOR.run(&pool).await?;

        let repository = BookRepository::new(pool);
        for payload in sample_books() {
            let book = repository.create(payload).await?;
            info!("Created book {}", book.id);
        }

        Ok(())
    }
}
