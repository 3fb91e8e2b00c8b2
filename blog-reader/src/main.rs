use anyhow::{bail, Context, Result};
use blog_reader::{
    enumerate_article_paths, ArticleState, ArticleView, ContentStore, DocumentAssembler, FeedPaginator, FeedSession,
    InMemoryStore, LoadOutcome, PrismicStore, ReaderConfig,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Reads the Spacetraveling blog from its content store", long_about = None)]
struct Cli {
    /// Content store API endpoint (defaults to PRISMIC_API_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Access token for private repositories (defaults to PRISMIC_ACCESS_TOKEN)
    #[arg(long, global = true)]
    access_token: Option<String>,
    /// Custom type holding the articles
    #[arg(long, global = true)]
    document_type: Option<String>,
    /// Articles per listing page
    #[arg(long, global = true)]
    page_size: Option<usize>,
    /// Read documents from a JSON file instead of the remote store
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the article listing
    Feed {
        /// Number of extra pages to load after the first one
        #[arg(long, default_value_t = 0)]
        pages: usize,
        #[arg(long)]
        json: bool,
    },
    /// Print one article page
    Article {
        uid: String,
        #[arg(long)]
        json: bool,
    },
    /// List the article routes to pre-render
    Paths,
}

impl Cli {
    fn config(&self) -> ReaderConfig {
        let mut config = ReaderConfig::from_env();
        if let Some(endpoint) = &self.endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(token) = &self.access_token {
            config.access_token = Some(token.clone());
        }
        if let Some(document_type) = &self.document_type {
            config.document_type = document_type.clone();
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size.max(1);
        }
        config
    }

    fn store(&self, config: &ReaderConfig) -> Result<Arc<dyn ContentStore>> {
        match &self.fixtures {
            Some(path) => {
                let store = InMemoryStore::from_json_file(path)
                    .with_context(|| format!("loading fixtures from {}", path.display()))?;
                Ok(Arc::new(store))
            }
            None => {
                let store = PrismicStore::new(config).context("creating content store client")?;
                Ok(Arc::new(store))
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.config();
    let store = cli.store(&config)?;
    info!("Reading from {}", store.store_name());

    match cli.command {
        Commands::Feed { pages, json } => print_feed(store, &config, pages, json).await,
        Commands::Article { uid, json } => print_article(store, &config, &uid, json).await,
        Commands::Paths => {
            let paths = enumerate_article_paths(store.as_ref(), &config).await;
            for route in paths.routes() {
                println!("{}", route);
            }
            Ok(())
        }
    }
}

async fn print_feed(store: Arc<dyn ContentStore>, config: &ReaderConfig, pages: usize, json: bool) -> Result<()> {
    let session = FeedSession::open(FeedPaginator::new(store, config))
        .await
        .context("loading the article listing")?;

    for _ in 0..pages {
        match session.load_more().await.context("loading more articles")? {
            LoadOutcome::Loaded(count) => info!("Loaded {} more articles", count),
            LoadOutcome::Exhausted => break,
            LoadOutcome::Busy => continue,
        }
    }

    let page = session.snapshot().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    for summary in &page.items {
        println!("{}", summary.title);
        if !summary.subtitle.is_empty() {
            println!("  {}", summary.subtitle);
        }
        println!(
            "  {} | {} | {}",
            summary.display_date().unwrap_or_default(),
            summary.author_name,
            summary.href()
        );
    }
    if session.can_load_more().await {
        println!("\nCarregar mais posts");
    }
    Ok(())
}

async fn print_article(store: Arc<dyn ContentStore>, config: &ReaderConfig, uid: &str, json: bool) -> Result<()> {
    let assembler = DocumentAssembler::new(store, config);
    let view = match assembler.resolve(uid).await.with_context(|| format!("loading article {}", uid))? {
        ArticleState::Ready(view) => view,
        ArticleState::NotFound => {
            error!("Article {} not found", uid);
            bail!("article {} not found", uid);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_article_text(&view);
    }
    Ok(())
}

fn print_article_text(view: &ArticleView) {
    let article = &view.article;
    if let Some(banner) = &article.banner_image_url {
        println!("[{}]", banner);
    }
    println!("{}", article.title);
    println!(
        "{} | {} | {}\n",
        view.formatted_date.as_deref().unwrap_or_default(),
        article.author_name,
        view.reading_time_label()
    );

    for section in &view.rendered_sections {
        println!("## {}", section.heading);
        println!("{}\n", section.html);
    }

    if let Some(previous) = &view.adjacent.previous {
        println!("Post anterior: {} ({})", previous.title, previous.href());
    }
    if let Some(next) = &view.adjacent.next {
        println!("Próximo post: {} ({})", next.title, next.href());
    }
}
