use flashcards_app::config::Config;
use flashcards_app::models::{AnswerOutcome, SystemClock};
use flashcards_app::{App, SqliteStore};

use chrono::{DateTime, Local, Utc};
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Formats a timestamp as a local YYYY-MM-DD string
fn format_date(time: DateTime<Utc>) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d").to_string()
}

/// Prints `message` and reads one trimmed line. `None` on end of input.
fn prompt(message: &str) -> io::Result<Option<String>> {
    print!("{} ", message);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

async fn seed_sample_topic(app: &mut App<SqliteStore>) -> Result<(), Box<dyn std::error::Error>> {
    let topic = app.create_topic("Polish Vocabulary").await?;
    app.select_topic(topic.id, |_| true).await?;
    app.add_flashcard("cześć", "hello").await?;
    app.add_flashcard("dziękuję", "thank you").await?;
    app.add_flashcard("proszę", "please").await?;
    println!("Sample data created!");
    Ok(())
}

async fn run_practice(app: &mut App<SqliteStore>) -> Result<(), Box<dyn std::error::Error>> {
    app.start_practice()?;

    while let Some(view) = app.snapshot().session {
        println!();
        println!("[{}/{}] {}", view.position, view.total, view.front);
        match prompt("Press Enter to reveal (q to stop):")?.as_deref() {
            None | Some("q") => {
                app.exit_practice();
                println!("Practice stopped, nothing was recorded.");
                return Ok(());
            }
            _ => {}
        }
        app.reveal_answer();
        if let Some(back) = app.snapshot().session.and_then(|v| v.back) {
            println!("  -> {}", back);
        }

        let is_correct = loop {
            match prompt("Did you know it? [y/n]:")?.as_deref() {
                Some("y") => break true,
                Some("n") => break false,
                None => {
                    app.exit_practice();
                    return Ok(());
                }
                _ => continue,
            }
        };

        if let AnswerOutcome::Completed(result) = app.answer(is_correct).await? {
            println!();
            println!("Score: {}", result.summary);
            println!("Next review: {}", format_date(result.next_review));
            if !result.is_saved() {
                println!("Warning: the result could not be saved.");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::info!("Database path: {:?}", config.db_path);
    let store = SqliteStore::open(&config.db_path)?;
    let mut app = App::new(store, Arc::new(SystemClock));

    let Some(identity) = config.identity.clone() else {
        println!("Not signed in. Set FLASHCARDS_IDENTITY to your principal to manage flashcards.");
        return Ok(());
    };
    app.on_auth_change(Some(identity)).await;
    if let Some(err) = app.last_error() {
        println!("Could not load topics: {}", err);
        return Ok(());
    }

    if app.cache().topics().is_empty() {
        seed_sample_topic(&mut app).await?;
    }

    loop {
        let snapshot = app.snapshot();
        let now = app.now();
        println!();
        println!("Topics ({})", snapshot.topics.len());
        for (i, topic) in snapshot.topics.iter().enumerate() {
            let due = if topic.is_due(now) { " (due)" } else { "" };
            println!(
                "{}. {} - next review {}{}",
                i + 1,
                topic.name,
                format_date(topic.next_review),
                due
            );
        }
        if let Some(result) = &snapshot.last_result {
            println!("Last session: {}", result);
        }

        let Some(choice) = prompt("Topic number to practice (q to quit):")? else {
            break;
        };
        if choice == "q" {
            break;
        }
        let Some(topic) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| snapshot.topics.get(i))
        else {
            println!("No such topic.");
            continue;
        };

        app.select_topic(topic.id, |_| true).await?;
        if let Err(e) = run_practice(&mut app).await {
            println!("{}", e);
        }
    }

    app.on_auth_change(None).await;
    Ok(())
}
