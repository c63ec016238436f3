use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use study_mate::{
    ai_utils::OpenAiGenerator,
    chapter::{ChapterStore, ContentSource},
    config::Config,
    flashcard::{DeckState, FlashcardWorkflow},
    history::HistoryStore,
    quiz::{session::QuizState, workflow::QuizWorkflow},
    summary::summarize_chapter,
    utils::{connect_database, init_log},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
    /// Path to the config file
    #[arg(short, long, default_value = "study_mate.toml")]
    config: PathBuf,
    /// Overrides the database path from the config
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    Chapter {
        #[command(subcommand)]
        command: ChapterCommand,
    },
    /// Take a quiz on a chapter
    Quiz {
        chapter_id: i64,
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// Browse flashcards for a chapter
    Flashcards { chapter_id: i64 },
    /// Print a bullet point summary of a chapter
    Summary { chapter_id: i64 },
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ChapterCommand {
    List {
        /// Only chapters whose title or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Text file with the chapter content
        file: PathBuf,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, clap::Subcommand)]
enum HistoryCommand {
    List,
    Show { id: i64 },
    Delete { id: i64 },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", e);
            return;
        }
    };
    let _guard = match init_log(config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{:?}", e);
            return;
        }
    };
    if let Err(e) = run(args, config).await {
        eprintln!("{:?}", e);
    }
}

async fn run(args: Args, config: Config) -> anyhow::Result<()> {
    let database = connect_database(args.database.as_ref().unwrap_or(&config.database)).await?;
    let chapters = Arc::new(ChapterStore::new(database.clone()));
    let history = Arc::new(HistoryStore::new(database));

    match args.command {
        Commands::Chapter { command } => match command {
            ChapterCommand::List { search } => {
                let list = match search {
                    Some(query) => chapters.search(&query).await?,
                    None => chapters.list().await?,
                };
                for chapter in list {
                    println!("{:<8} {}", chapter.id, chapter.title);
                }
            }
            ChapterCommand::Add {
                title,
                description,
                file,
            } => {
                let content = tokio::fs::read_to_string(&file).await?;
                let id = chapters.add(&title, &description, &content).await?;
                println!("Chapter created with id: {}", id);
            }
            ChapterCommand::Show { id } => match chapters.get(id).await? {
                Some(chapter) => {
                    println!("# {}\n", chapter.title);
                    if !chapter.description.is_empty() {
                        println!("{}\n", chapter.description);
                    }
                    println!("{}", chapter.content);
                }
                None => println!("Chapter not found: {}", id),
            },
            ChapterCommand::Delete { id } => {
                if chapters.delete(id).await? {
                    println!("Chapter deleted with id: {}", id);
                } else {
                    println!("Chapter not found: {}", id);
                }
            }
        },
        Commands::History { command } => match command {
            HistoryCommand::List => {
                for entry in history.list().await? {
                    println!(
                        "{:<8} {:>3}%  {}  {}",
                        entry.id,
                        entry.score,
                        entry.date.date(),
                        entry.chapter_title
                    );
                }
            }
            HistoryCommand::Show { id } => match history.get(id).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("Quiz result not found: {}", id),
            },
            HistoryCommand::Delete { id } => {
                if history.delete(id).await? {
                    println!("Quiz result deleted with id: {}", id);
                } else {
                    println!("Quiz result not found: {}", id);
                }
            }
        },
        Commands::Quiz { chapter_id, count } => {
            let generator = Arc::new(OpenAiGenerator::new(&config.ai)?);
            let mut workflow = QuizWorkflow::new(
                chapter_id,
                config.quiz,
                chapters,
                generator,
                history,
                config.generation_timeout(),
            );
            if let Some(count) = count {
                workflow.session_mut().select_count(count)?;
            }
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            take_quiz(&mut workflow, &mut input).await?;
        }
        Commands::Flashcards { chapter_id } => {
            let generator = Arc::new(OpenAiGenerator::new(&config.ai)?);
            let mut workflow =
                FlashcardWorkflow::new(chapter_id, chapters, generator, config.generation_timeout());
            let mut input = BufReader::new(tokio::io::stdin()).lines();
            browse_flashcards(&mut workflow, &mut input).await?;
        }
        Commands::Summary { chapter_id } => {
            let generator = OpenAiGenerator::new(&config.ai)?;
            match summarize_chapter(
                chapters.as_ref(),
                &generator,
                chapter_id,
                config.generation_timeout(),
            )
            .await
            {
                Ok(summary) => println!("{}", summary),
                Err(failure) => println!("{}", failure.message),
            }
        }
    }
    Ok(())
}

async fn prompt(input: &mut Input, text: &str) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

async fn confirm(input: &mut Input, text: &str) -> anyhow::Result<bool> {
    Ok(prompt(input, text)
        .await?
        .is_some_and(|answer| answer.eq_ignore_ascii_case("y")))
}

/// Options are listed from 1, so any number of them can be shown.
fn pick_option<'a>(options: &'a [String], answer: &str) -> Option<&'a String> {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
}

async fn take_quiz(
    workflow: &mut QuizWorkflow<ChapterStore, OpenAiGenerator, HistoryStore>,
    input: &mut Input,
) -> anyhow::Result<()> {
    loop {
        println!("Generating {} questions...", workflow.session().count());
        if let QuizState::Error { failure } = workflow.generate().await {
            println!("{}", failure.message);
            if failure.retryable && confirm(input, "Retry? [y/N] ").await? {
                continue;
            }
            return Ok(());
        }

        let questions = workflow.session().questions().to_vec();
        for (index, question) in questions.iter().enumerate() {
            println!("\n{}. {}", index + 1, question.question);
            for (i, option) in question.options.iter().enumerate() {
                println!("   {}) {}", i + 1, option);
            }
            loop {
                let Some(answer) = prompt(input, "> ").await? else {
                    return Ok(());
                };
                match pick_option(&question.options, &answer) {
                    Some(option) => {
                        workflow.select_answer(index, option.clone());
                        break;
                    }
                    None => println!("Pick one of the listed numbers"),
                }
            }
        }

        let Some(submission) = workflow.submit() else {
            return Ok(());
        };
        if let Some(results) = workflow.session().results() {
            for result in results.iter().filter(|r| !r.is_correct) {
                println!(
                    "{}. your answer: {}, correct: {}",
                    result.index + 1,
                    result.user_answer.as_deref().unwrap_or("-"),
                    result.correct_answer
                );
            }
        }
        println!("\nScore: {}%", submission.outcome.score);
        if submission.history.await?.is_none() {
            println!("Result could not be saved");
        }

        if !confirm(input, "Retake? [y/N] ").await? {
            return Ok(());
        }
        workflow.retake();
    }
}

async fn browse_flashcards(
    workflow: &mut FlashcardWorkflow<ChapterStore, OpenAiGenerator>,
    input: &mut Input,
) -> anyhow::Result<()> {
    println!("Generating flashcards...");
    loop {
        if let DeckState::Error { failure } = workflow.generate().await {
            println!("{}", failure.message);
            if failure.retryable && confirm(input, "Retry? [y/N] ").await? {
                continue;
            }
            return Ok(());
        }
        loop {
            let deck = workflow.deck();
            let Some((index, card, flipped)) = deck.current() else {
                return Ok(());
            };
            println!("\n[{}/{}] {}", index + 1, deck.cards().len(), card.term);
            if flipped {
                println!("    {}", card.definition);
            }
            let Some(command) = prompt(input, "(f)lip (n)ext (p)rev (r)egenerate (q)uit > ").await?
            else {
                return Ok(());
            };
            let deck = workflow.deck_mut();
            match command.as_str() {
                "f" | "" => deck.flip(),
                "n" => {
                    deck.next();
                }
                "p" => {
                    deck.previous();
                }
                "r" => break,
                "q" => return Ok(()),
                _ => {}
            }
        }
        println!("Regenerating flashcards...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_picked_by_number() {
        let options: Vec<String> = (0..300).map(|i| format!("option {i}")).collect();
        assert_eq!(pick_option(&options, "1").map(String::as_str), Some("option 0"));
        assert_eq!(pick_option(&options, "300").map(String::as_str), Some("option 299"));
        assert!(pick_option(&options, "0").is_none());
        assert!(pick_option(&options, "301").is_none());
        assert!(pick_option(&options, "a").is_none());
        assert!(pick_option(&options, "").is_none());
    }
}
