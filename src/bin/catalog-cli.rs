use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Command-line client for the book catalog API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    base: String,

    /// Username for Basic auth.
    #[arg(short, long, env = "API_USER")]
    user: Option<String>,

    /// Password for Basic auth.
    #[arg(short, long = "pass", env = "API_PASS", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List books (supports filters)
    List(Filters),
    /// Get a book by index
    Get { id: i64 },
    /// Add a book (Basic auth)
    Add(NewBook),
    /// Delete a book by index (Basic auth)
    Delete { id: i64 },
    /// Collection statistics
    Stats,
    /// List authors
    Authors,
    /// List languages
    Languages,
    /// List countries
    Countries,
}

#[derive(Args)]
struct Filters {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    pages_min: Option<i64>,
    #[arg(long)]
    pages_max: Option<i64>,
}

impl Filters {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let text = [
            ("title", &self.title),
            ("author", &self.author),
            ("language", &self.language),
            ("country", &self.country),
        ];
        for (name, value) in text {
            if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                params.push((name, v.clone()));
            }
        }
        if let Some(min) = self.pages_min {
            params.push(("pages_min", min.to_string()));
        }
        if let Some(max) = self.pages_max {
            params.push(("pages_max", max.to_string()));
        }
        params
    }
}

#[derive(Args)]
struct NewBook {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    pages: Option<i64>,
    #[arg(long)]
    country: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    year: Option<i64>,
    #[arg(long)]
    link: Option<String>,
    #[arg(long = "image-link")]
    image_link: Option<String>,
}

impl NewBook {
    fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("title".into(), self.title.clone().into());
        let text = [
            ("author", &self.author),
            ("country", &self.country),
            ("language", &self.language),
            ("link", &self.link),
            ("imageLink", &self.image_link),
        ];
        for (name, value) in text {
            if let Some(v) = value {
                body.insert(name.into(), v.clone().into());
            }
        }
        if let Some(pages) = self.pages {
            body.insert("pages".into(), pages.into());
        }
        if let Some(year) = self.year {
            body.insert("year".into(), year.into());
        }
        Value::Object(body)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()?;
    let base = cli.base.trim_end_matches('/');

    let auth = cli.user.as_ref().map(|u| (u.clone(), cli.password.clone()));
    let with_auth = |req: reqwest::RequestBuilder| match &auth {
        Some((user, pass)) => req.basic_auth(user, pass.as_ref()),
        None => req,
    };

    let request = match &cli.command {
        Commands::List(filters) => client
            .get(format!("{base}/books"))
            .query(&filters.to_params()),
        Commands::Get { id } => client.get(format!("{base}/books/{id}")),
        Commands::Add(book) => with_auth(client.post(format!("{base}/books")).json(&book.to_json())),
        Commands::Delete { id } => {
            if auth.is_none() {
                eprintln!("DELETE requires Basic auth (--user).");
                std::process::exit(1);
            }
            with_auth(client.delete(format!("{base}/books/{id}")))
        }
        Commands::Stats => client.get(format!("{base}/books/stats")),
        Commands::Authors => client.get(format!("{base}/books/authors")),
        Commands::Languages => client.get(format!("{base}/books/languages")),
        Commands::Countries => client.get(format!("{base}/books/countries")),
    };

    let res = match request.send().await {
        Ok(res) => res,
        Err(e) if e.is_connect() => {
            eprintln!("Could not connect to API at {base}. Is the server running?");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if !print_response(res).await? {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the body as pretty JSON. Returns false for non-success statuses.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{rendered}");
        Ok(true)
    } else {
        eprintln!("Error: API returned status {status}");
        eprintln!("{rendered}");
        Ok(false)
    }
}
