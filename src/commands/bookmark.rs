use clap::{Args, Subcommand};

use esteana::db::Store;

use super::OutputFormat;

#[derive(Args)]
pub struct BookmarkCommand {
    #[command(subcommand)]
    pub command: BookmarkSubcommand,
}

#[derive(Subcommand)]
pub enum BookmarkSubcommand {
    /// Bookmark a verse
    Add {
        /// Chapter number
        chapter: u32,

        /// Verse number within the chapter
        verse: u32,

        /// Verse text to keep with the bookmark (defaults to the stored text)
        #[arg(long)]
        text: Option<String>,
    },

    /// Remove a bookmark
    Remove {
        /// Chapter number
        chapter: u32,

        /// Verse number within the chapter
        verse: u32,
    },

    /// List bookmarks, oldest first
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl BookmarkCommand {
    pub async fn run(&self, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
        let bookmarks = store.bookmarks();

        match &self.command {
            BookmarkSubcommand::Add {
                chapter,
                verse,
                text,
            } => {
                let text = match text {
                    Some(t) => t.clone(),
                    None => store
                        .scripture()
                        .get(*chapter)
                        .await?
                        .and_then(|c| c.verse(*verse).map(|v| v.text.clone()))
                        .unwrap_or_default(),
                };
                let id = bookmarks.add(*chapter, *verse, &text).await?;
                println!("Bookmarked {}", id);
                Ok(())
            }
            BookmarkSubcommand::Remove { chapter, verse } => {
                if !bookmarks.contains(*chapter, *verse).await? {
                    return Err(format!("No bookmark at {}:{}", chapter, verse).into());
                }
                bookmarks.remove(*chapter, *verse).await?;
                println!("Removed bookmark {}:{}", chapter, verse);
                Ok(())
            }
            BookmarkSubcommand::List { format } => {
                let list = bookmarks.list().await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
                    OutputFormat::Text => {
                        if list.is_empty() {
                            println!("No bookmarks.");
                        }
                        for b in &list {
                            println!(
                                "{:>3}:{:<3}  {}  {}",
                                b.chapter,
                                b.verse,
                                b.added_at.format("%Y-%m-%d"),
                                b.text
                            );
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
