use anyhow::Context;
use clap::{Parser, Subcommand};
use dashboard_core::{
    Config, FetchState, WeatherError, WeatherSnapshot, WeatherWidget,
    menu::{MENU_ITEMS, MenuItem, Screen},
    render::{LOADING_TEXT, render_state},
};
use inquire::{Confirm, CustomType, InquireError, Password, Text};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "dashboard", version, about = "Dashboard weather widget")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key and geolocation.
    Configure,

    /// Show the current weather.
    ///
    /// Without a city the widget uses your location and falls back to Warsaw.
    Weather {
        /// City to search for.
        #[arg(conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        /// Latitude to use instead of the location lookup.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to use instead of the location lookup.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Skip geolocation and go straight to the default city.
        #[arg(long)]
        no_geolocation: bool,

        /// Print the weather snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the weather for your location, then search from a prompt.
    Interactive,

    /// List the dashboard navigation entries.
    Menu {
        /// Only show the entry for this screen, e.g. "weather".
        screen: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Weather { city, lat, lon, no_geolocation, json } => {
                let mut config = Config::load()?;
                if let (Some(lat), Some(lon)) = (lat, lon) {
                    config.geolocation.enabled = true;
                    config.geolocation.latitude = Some(lat);
                    config.geolocation.longitude = Some(lon);
                }
                if no_geolocation {
                    config.geolocation.enabled = false;
                }

                let widget = WeatherWidget::from_config(&config)?;
                let pending = match city {
                    Some(city) => widget.controller().search(&city),
                    None => widget.activate().await,
                };
                if let Some(pending) = pending {
                    pending.finished().await;
                }

                print_outcome(&widget.state(), json)
            }
            Command::Interactive => interactive().await,
            Command::Menu { screen } => {
                for item in menu_entries(screen.as_deref())? {
                    println!("{:<12} {:<14} {}", item.icon, item.label, item.id);
                }
                Ok(())
            }
        }
    }
}

fn print_outcome(state: &FetchState, json: bool) -> anyhow::Result<()> {
    match state {
        FetchState::Success(snapshot) if json => {
            let out = serde_json::to_string_pretty(&snapshot_json(snapshot)?)
                .context("Failed to serialize weather snapshot")?;
            println!("{out}");
            Ok(())
        }
        FetchState::Failure(err) => {
            for line in failure_help(err) {
                eprintln!("{line}");
            }
            Err(err.clone().into())
        }
        state => {
            println!("{}", render_state(state));
            Ok(())
        }
    }
}

/// Snapshot fields plus the icon the widget would show.
fn snapshot_json(snapshot: &WeatherSnapshot) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(snapshot).context("Failed to serialize weather snapshot")?;
    if let Some(fields) = value.as_object_mut() {
        fields.insert("icon".to_string(), snapshot.presentation().icon_name().into());
    }
    Ok(value)
}

fn failure_help(err: &WeatherError) -> Vec<String> {
    err.guidance().into_iter().chain(err.help_link().map(str::to_string)).collect()
}

fn menu_entries(filter: Option<&str>) -> anyhow::Result<Vec<MenuItem>> {
    match filter {
        Some(name) => {
            let screen = Screen::try_from(name)?;
            Ok(MENU_ITEMS.iter().copied().filter(|item| item.id == screen).collect())
        }
        None => Ok(MENU_ITEMS.to_vec()),
    }
}

async fn interactive() -> anyhow::Result<()> {
    let config = Config::load()?;
    let widget = WeatherWidget::from_config(&config)?;

    if let Some(pending) = widget.activate().await {
        println!("{LOADING_TEXT}");
        pending.finished().await;
    }
    println!("{}\n", render_state(&widget.state()));

    loop {
        let answer = tokio::task::spawn_blocking(|| {
            Text::new("City:")
                .with_placeholder("e.g. London, New York, Tokyo")
                .with_help_message("Esc to quit")
                .prompt_skippable()
        })
        .await
        .context("Prompt task failed")?;

        let input = match answer {
            Ok(Some(input)) => input,
            Ok(None) | Err(InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read search input"),
        };

        widget.controller().set_search_input(input);
        if let Some(pending) = widget.controller().submit_search() {
            pending.finished().await;
        }
        println!("{}\n", render_state(&widget.state()));
    }

    widget.deactivate();
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let help = if config.resolve_api_key().is_fallback() {
        "No key configured yet; requests will be rejected until one is set"
    } else {
        "Leave empty to keep the current key"
    };
    let key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message(help)
        .prompt()?;
    if !key.trim().is_empty() {
        config.set_api_key(key.trim().to_string());
    }

    config.geolocation.enabled = Confirm::new("Use your location for the initial weather?")
        .with_default(config.geolocation.enabled)
        .prompt()?;

    if config.geolocation.enabled {
        let pin = Confirm::new("Pin coordinates instead of looking up your IP location?")
            .with_default(config.pinned_coordinates().is_some())
            .prompt()?;

        if pin {
            let lat = CustomType::<f64>::new("Latitude:").prompt()?;
            let lon = CustomType::<f64>::new("Longitude:").prompt()?;
            config.geolocation.latitude = Some(lat);
            config.geolocation.longitude = Some(lon);
        } else {
            config.geolocation.latitude = None;
            config.geolocation.longitude = None;
        }
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
