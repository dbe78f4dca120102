use clap::Args;

use esteana::acquisition::{ensure_scripture, Cascade, ScriptureState};
use esteana::config::Config;
use esteana::db::Store;
use esteana::models::ScriptureUnit;

use super::{environment, OutputFormat};

/// Fill the scripture store from the first reachable source
#[derive(Args)]
pub struct AcquireCommand {
    /// Acquire even if chapters are already stored
    #[arg(long, short)]
    force: bool,
}

impl AcquireCommand {
    pub async fn run(&self, store: &Store, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let env = environment(config).await?;
        let cascade = Cascade::for_environment(&env, &config.endpoints())?;
        println!(
            "Context: {:?} (sources: {})",
            env.context(),
            cascade.source_names().join(", ")
        );

        match ensure_scripture(store, &cascade, self.force).await? {
            ScriptureState::Ready(chapters) => {
                let verses: usize = chapters.iter().map(|c| c.verses.len()).sum();
                println!("{} chapters, {} verses stored.", chapters.len(), verses);
                Ok(())
            }
            ScriptureState::Unavailable(reason) => Err(reason.into()),
        }
    }
}

/// List stored chapters or show one
#[derive(Args)]
pub struct ChaptersCommand {
    /// Chapter number to show in full
    #[arg(long, short)]
    number: Option<u32>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl ChaptersCommand {
    pub async fn run(&self, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
        let repo = store.scripture();

        if let Some(number) = self.number {
            let chapter = repo
                .get(number)
                .await?
                .ok_or_else(|| format!("Chapter {} is not stored", number))?;
            match self.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chapter)?),
                OutputFormat::Text => print_chapter(&chapter),
            }
            return Ok(());
        }

        let chapters = repo.list().await?;
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&chapters)?),
            OutputFormat::Text => {
                if chapters.is_empty() {
                    println!("No chapters stored. Run `esteana acquire` first.");
                    return Ok(());
                }
                for chapter in &chapters {
                    println!(
                        "{:>3}  {} ({} verses)",
                        chapter.number,
                        chapter.name,
                        chapter.verses.len()
                    );
                }
            }
        }
        Ok(())
    }
}

fn print_chapter(chapter: &ScriptureUnit) {
    println!("{} {}", chapter.number, chapter.name);
    if !chapter.english_name.is_empty() {
        println!("{} ({})", chapter.english_name, chapter.english_name_translation);
    }
    println!();
    for verse in &chapter.verses {
        println!("{:>3}. {}", verse.number_in_chapter, verse.text);
    }
}
