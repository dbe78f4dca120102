use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand, ValueEnum};

use esteana::db::Store;
use esteana::models::{NotificationPrefs, Settings, SettingsPatch, Theme};

use super::OutputFormat;

#[derive(Args)]
pub struct SettingsCommand {
    #[command(subcommand)]
    pub command: SettingsSubcommand,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show the profile settings
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update profile fields; omitted fields are left unchanged
    Set {
        /// Age group (child, youth, adult)
        #[arg(long)]
        age_group: Option<String>,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Reader font size
        #[arg(long)]
        font_size: Option<u32>,

        /// Theme (light, dark, sepia)
        #[arg(long)]
        theme: Option<Theme>,

        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<NaiveDate>,

        /// Occupation
        #[arg(long)]
        job: Option<String>,

        /// Gender
        #[arg(long)]
        gender: Option<String>,

        /// Reminder notifications
        #[arg(long, value_enum)]
        notifications: Option<Toggle>,

        /// Hours between reminders
        #[arg(long)]
        frequency_hours: Option<u32>,
    },

    /// Show or save the last reading position
    Position {
        /// Chapter number
        #[arg(requires = "verse")]
        chapter: Option<u32>,

        /// Verse number within the chapter
        verse: Option<u32>,
    },
}

impl SettingsCommand {
    pub async fn run(&self, store: &Store) -> Result<(), Box<dyn std::error::Error>> {
        let repo = store.settings();

        match &self.command {
            SettingsSubcommand::Show { format } => {
                let settings = repo.get().await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
                    OutputFormat::Text => print_settings(&settings),
                }
                Ok(())
            }
            SettingsSubcommand::Set {
                age_group,
                name,
                font_size,
                theme,
                birth_date,
                job,
                gender,
                notifications,
                frequency_hours,
            } => {
                let notifications = if notifications.is_some() || frequency_hours.is_some() {
                    let current = repo.get().await?.notifications.unwrap_or_default();
                    Some(NotificationPrefs {
                        enabled: match notifications {
                            Some(Toggle::On) => true,
                            Some(Toggle::Off) => false,
                            None => current.enabled,
                        },
                        frequency_hours: frequency_hours.unwrap_or(current.frequency_hours),
                    })
                } else {
                    None
                };

                let patch = SettingsPatch {
                    age_group: age_group.clone(),
                    display_name: name.clone(),
                    font_size: *font_size,
                    last_position: None,
                    theme: *theme,
                    birth_date: *birth_date,
                    job: job.clone(),
                    gender: gender.clone(),
                    notifications,
                };
                if patch.is_empty() {
                    return Err("Nothing to update. See `esteana settings set --help`".into());
                }

                let saved = repo.save(patch).await?;
                println!("Settings saved.");
                print_settings(&saved);
                Ok(())
            }
            SettingsSubcommand::Position { chapter, verse } => {
                if let (Some(chapter), Some(verse)) = (chapter, verse) {
                    repo.save_last_position(*chapter, *verse).await?;
                    println!("Saved position {}:{}", chapter, verse);
                    return Ok(());
                }
                match repo.last_position().await? {
                    Some(pos) => println!("{}:{}", pos.chapter, pos.verse),
                    None => println!("No reading position saved."),
                }
                Ok(())
            }
        }
    }
}

fn print_settings(settings: &Settings) {
    let or_unset = |v: Option<&str>| v.unwrap_or("(not set)").to_string();

    println!("Name:       {}", or_unset(settings.display_name.as_deref()));
    println!("Age group:  {}", or_unset(settings.age_group.as_deref()));
    match settings.birth_date {
        Some(birth) => {
            let age = settings
                .calculated_age(Utc::now().date_naive())
                .map(|a| format!(" (age {})", a))
                .unwrap_or_default();
            println!("Birth date: {}{}", birth, age);
        }
        None => println!("Birth date: (not set)"),
    }
    println!("Job:        {}", or_unset(settings.job.as_deref()));
    println!("Gender:     {}", or_unset(settings.gender.as_deref()));
    println!("Font size:  {}", settings.effective_font_size());
    println!("Theme:      {}", settings.effective_theme());
    let prefs = settings.notifications.clone().unwrap_or_default();
    println!(
        "Reminders:  {} (every {}h)",
        if prefs.enabled { "on" } else { "off" },
        prefs.frequency_hours
    );
    if let Some(pos) = settings.last_position {
        println!("Position:   {}:{}", pos.chapter, pos.verse);
    }
    println!("Updated:    {}", settings.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
}
