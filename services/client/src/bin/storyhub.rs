//! services/client/src/bin/storyhub.rs

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use client_lib::{
    adapters::{CacheSignal, ChannelCacheNotifier},
    app::{commands, AppState},
    config::Config,
    error::ClientError,
};
use storyhub_core::{ConnectivityFlag, GeoPoint, LocationFilter, StoryQuery};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storyhub")]
#[command(about = "StoryHub client - browse and share geotagged stories, online or offline", long_about = None)]
struct Cli {
    /// Treat the network as unavailable.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List a page of stories
    Stories {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
        /// Only stories that carry a location
        #[arg(long)]
        with_location: bool,
    },
    /// Show one story with its location
    Story { id: String },
    /// Post a new story
    Post {
        #[arg(long)]
        description: String,
        #[arg(long)]
        photo: Option<PathBuf>,
        #[arg(long, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
    },
    /// Keep a story available offline
    Save { id: String },
    /// List stories kept offline
    Saved,
    /// Remove a story from offline storage
    Unsave { id: String },
    /// Delete all offline data
    ClearOffline {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Start the Cache Listener ---
    let (notifier, mut signals) = ChannelCacheNotifier::channel();
    let listener = tokio::spawn(async move {
        while let Some(CacheSignal::ClearApiCaches { caches }) = signals.recv().await {
            info!(caches = ?caches, "Dropping API response caches");
        }
    });

    // --- 3. Build the Shared AppState ---
    let connectivity = Arc::new(ConnectivityFlag::new(!cli.offline));
    let state =
        AppState::initialize(config.clone(), connectivity, Some(Arc::new(notifier))).await?;
    state.session.subscribe(|session| {
        if session.is_logged_in {
            info!(user = %session.username, "Session active");
        } else {
            info!("No active session");
        }
    });

    // --- 4. Run the Command ---
    let output = match cli.command {
        Commands::Login { email, password } => commands::login(&state, &email, &password).await?,
        Commands::Register {
            name,
            email,
            password,
        } => commands::register(&state, &name, &email, &password).await?,
        Commands::Logout => commands::logout(&state).await?,
        Commands::Whoami => commands::whoami(&state),
        Commands::Stories {
            page,
            size,
            with_location,
        } => {
            let query = StoryQuery {
                page,
                size: size.unwrap_or(config.default_page_size),
                location: if with_location {
                    LocationFilter::WithLocation
                } else {
                    LocationFilter::Any
                },
            };
            commands::list_stories(&state, query).await?
        }
        Commands::Story { id } => commands::show_story(&state, &id).await?,
        Commands::Post {
            description,
            photo,
            lat,
            lon,
        } => {
            let location = GeoPoint::from_parts(lat, lon);
            commands::post_story(&state, description, photo.as_deref(), location).await?
        }
        Commands::Save { id } => commands::save_story(&state, &id).await?,
        Commands::Saved => commands::list_saved(&state).await,
        Commands::Unsave { id } => commands::remove_saved(&state, &id).await?,
        Commands::ClearOffline { yes } => commands::clear_offline(&state, yes).await?,
    };

    println!("{output}");

    // Closing the notifier lets the listener drain and exit.
    drop(state);
    if let Err(e) = listener.await {
        warn!("Cache listener stopped abnormally: {}", e);
    }
    Ok(())
}
