//! Command-line front end for the catalog service.
//!
//! One subcommand per API operation; reads go through the query cache and
//! mutations through the real mutation path, so invalidation and
//! notifications behave exactly as they do for library consumers.

use std::error::Error;
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use folio::cache::QueryCache;
use folio::client::ApiClient;
use folio::config::{self, SettingsOverrides};
use folio::domain::{
    AuthorDraft, AuthorPatch, BookDraft, BookPatch, CategoryDraft, CategoryPatch, ListParams,
};
use folio::infra::telemetry;
use folio::service::{CatalogService, LogNotifier};

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Bookstore catalog client")]
struct Cli {
    #[command(flatten)]
    overrides: SettingsOverrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Book operations.
    #[command(subcommand)]
    Books(BooksCmd),
    /// Author operations.
    #[command(subcommand)]
    Authors(AuthorsCmd),
    /// Category operations.
    #[command(subcommand)]
    Categories(CategoriesCmd),
    /// Free-text search across books.
    Search {
        /// Search query.
        query: String,
    },
    /// Check API health.
    Health,
}

#[derive(Debug, Args, Default, Clone)]
struct ListArgs {
    /// Filter by search text.
    #[arg(long)]
    search: Option<String>,
    /// Number of items to skip.
    #[arg(long, default_value_t = 0)]
    skip: u32,
    /// Page size.
    #[arg(long, default_value_t = 10)]
    limit: u32,
}

impl From<ListArgs> for ListParams {
    fn from(args: ListArgs) -> Self {
        Self {
            search: args.search,
            skip: args.skip,
            limit: args.limit,
        }
    }
}

#[derive(Debug, Subcommand)]
enum BooksCmd {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        isbn: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value_t = 0)]
        stock: i64,
        #[arg(long = "author-id")]
        author_id: i64,
        #[arg(long)]
        description: Option<String>,
        /// Publication date, RFC 3339.
        #[arg(long)]
        published: Option<String>,
        #[arg(long = "category-id")]
        category_ids: Vec<i64>,
    },
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        stock: Option<i64>,
        #[arg(long = "author-id")]
        author_id: Option<i64>,
        #[arg(long)]
        description: Option<String>,
        /// Publication date, RFC 3339.
        #[arg(long)]
        published: Option<String>,
        #[arg(long = "category-id")]
        category_ids: Option<Vec<i64>>,
    },
    Delete {
        id: i64,
    },
    /// Apply a signed delta to a book's stock count.
    Stock {
        id: i64,
        /// Signed change, e.g. 5 or -3.
        #[arg(long, allow_hyphen_values = true)]
        change: i64,
    },
}

#[derive(Debug, Subcommand)]
enum AuthorsCmd {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        biography: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        biography: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum CategoriesCmd {
    List {
        #[command(flatten)]
        list: ListArgs,
    },
    Get {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = config::load(&cli.overrides)?;
    telemetry::init(&settings.logging)?;

    let client = Arc::new(ApiClient::new(&settings.api)?);
    let cache = Arc::new(QueryCache::new());
    let service = CatalogService::new(client, cache, Arc::new(LogNotifier));

    match cli.command {
        Command::Books(cmd) => run_books(&service, cmd).await,
        Command::Authors(cmd) => run_authors(&service, cmd).await,
        Command::Categories(cmd) => run_categories(&service, cmd).await,
        Command::Search { query } => {
            match service.search(&query).await? {
                Some(books) => print_json(books.as_ref())?,
                None => print_json(&Vec::<()>::new())?,
            }
            Ok(())
        }
        Command::Health => {
            let health = service.health().await?;
            print_json(health.as_ref())?;
            Ok(())
        }
    }
}

async fn run_books(service: &CatalogService, cmd: BooksCmd) -> Result<(), Box<dyn Error>> {
    match cmd {
        BooksCmd::List { list } => {
            let page = service.books(list.into()).await?;
            print_json(page.as_ref())
        }
        BooksCmd::Get { id } => match service.book(Some(id)).await? {
            Some(book) => print_json(book.as_ref()),
            None => Ok(()),
        },
        BooksCmd::Create {
            title,
            isbn,
            price,
            stock,
            author_id,
            description,
            published,
            category_ids,
        } => {
            let draft = BookDraft {
                title,
                isbn,
                price,
                stock_quantity: stock,
                author_id,
                description,
                published_date: parse_datetime(published.as_deref())?,
                category_ids,
            };
            print_json(&service.create_book(draft).await?)
        }
        BooksCmd::Update {
            id,
            title,
            isbn,
            price,
            stock,
            author_id,
            description,
            published,
            category_ids,
        } => {
            let patch = BookPatch {
                title,
                isbn,
                description,
                price,
                stock_quantity: stock,
                published_date: parse_datetime(published.as_deref())?,
                author_id,
                category_ids,
            };
            print_json(&service.update_book(id, patch).await?)
        }
        BooksCmd::Delete { id } => {
            service.delete_book(id).await?;
            println!("deleted");
            Ok(())
        }
        BooksCmd::Stock { id, change } => {
            print_json(&service.patch_book_stock(id, change).await?)
        }
    }
}

async fn run_authors(service: &CatalogService, cmd: AuthorsCmd) -> Result<(), Box<dyn Error>> {
    match cmd {
        AuthorsCmd::List { list } => {
            let page = service.authors(list.into()).await?;
            print_json(page.as_ref())
        }
        AuthorsCmd::Get { id } => match service.author(Some(id)).await? {
            Some(author) => print_json(author.as_ref()),
            None => Ok(()),
        },
        AuthorsCmd::Create {
            name,
            email,
            biography,
        } => {
            let draft = AuthorDraft {
                name,
                email,
                biography,
            };
            print_json(&service.create_author(draft).await?)
        }
        AuthorsCmd::Update {
            id,
            name,
            email,
            biography,
        } => {
            let patch = AuthorPatch {
                name,
                email,
                biography,
            };
            print_json(&service.update_author(id, patch).await?)
        }
        AuthorsCmd::Delete { id } => {
            service.delete_author(id).await?;
            println!("deleted");
            Ok(())
        }
    }
}

async fn run_categories(
    service: &CatalogService,
    cmd: CategoriesCmd,
) -> Result<(), Box<dyn Error>> {
    match cmd {
        CategoriesCmd::List { list } => {
            let page = service.categories(list.into()).await?;
            print_json(page.as_ref())
        }
        CategoriesCmd::Get { id } => match service.category(Some(id)).await? {
            Some(category) => print_json(category.as_ref()),
            None => Ok(()),
        },
        CategoriesCmd::Create { name, description } => {
            let draft = CategoryDraft { name, description };
            print_json(&service.create_category(draft).await?)
        }
        CategoriesCmd::Update {
            id,
            name,
            description,
        } => {
            let patch = CategoryPatch { name, description };
            print_json(&service.update_category(id, patch).await?)
        }
        CategoriesCmd::Delete { id } => {
            service.delete_category(id).await?;
            println!("deleted");
            Ok(())
        }
    }
}

fn parse_datetime(value: Option<&str>) -> Result<Option<OffsetDateTime>, Box<dyn Error>> {
    value
        .map(|text| OffsetDateTime::parse(text, &Rfc3339))
        .transpose()
        .map_err(Into::into)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
