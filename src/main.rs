mod debug_report;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use formwright::{
    BlockPath, DataSet, Dictionary, DictionaryStore, Document, EmbeddingSimilarity, HashingEmbedder,
    JsonDictionaryStore, NamedTemplate, Naming, Options, Position, RowSource, SynonymResolver, apply_review,
    detect_fields_verbose, fill_batch, insert_placeholder, placeholder_for, remaining_placeholders,
    review_candidates, templatize,
};
use indexmap::IndexMap;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "formwright")]
#[command(about = "Detect form fields, keep a canonical field dictionary and fill {{field}} templates")]
#[command(version)]
struct Cli {
    /// Dictionary file
    #[arg(long, global = true, value_name = "PATH", default_value = "campos.json")]
    dict: PathBuf,

    /// Force ANSI color output
    #[arg(long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct DetectArgs {
    /// Document to scan (JSON)
    document: PathBuf,

    /// Keyword list, one per line, replacing the built-in list
    #[arg(long, value_name = "PATH")]
    keywords: Option<PathBuf>,

    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate fields found in a document
    Detect {
        #[command(flatten)]
        args: DetectArgs,
    },
    /// Match detected fields against the dictionary
    Review {
        #[command(flatten)]
        args: DetectArgs,

        /// Similarity needed to suggest a synonym
        #[arg(long, default_value_t = SynonymResolver::<HashingSimilarity>::DEFAULT_THRESHOLD)]
        threshold: f32,

        /// Apply every proposal and save the dictionary
        #[arg(long)]
        accept: bool,
    },
    /// Inspect or edit the dictionary
    Dict {
        #[command(subcommand)]
        command: DictCommands,
    },
    /// Print the placeholder for every column of a data source
    Keys {
        /// CSV or JSON data source
        data: PathBuf,
    },
    /// Fill templates once per data row
    Fill {
        /// CSV or JSON data source
        data: PathBuf,

        /// Templates (JSON documents)
        #[arg(required = true)]
        templates: Vec<PathBuf>,

        /// Output directory
        #[arg(long, short, default_value = "documentos_generados")]
        out: PathBuf,

        /// Column used in output file names
        #[arg(long, default_value = "Nombre")]
        name_column: String,
    },
    /// Turn detected labels into `label: {{key}}` placeholders
    Template {
        #[command(flatten)]
        args: DetectArgs,

        /// LABEL=KEY; when given, only these labels are rewritten
        #[arg(long = "map", value_name = "LABEL=KEY")]
        mappings: Vec<String>,

        /// Output document
        #[arg(long, short, default_value = "plantilla_generada.json")]
        out: PathBuf,
    },
    /// Put a placeholder into one paragraph
    Insert {
        /// Document to edit (JSON)
        document: PathBuf,

        /// Paragraph location, e.g. `3` or `1/r0c2/p0`
        path: String,

        /// Field key
        key: String,

        #[arg(long, value_enum, default_value_t = PositionArg::End)]
        position: PositionArg,

        /// Output document
        #[arg(long, short, default_value = "documento_con_claves.json")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum DictCommands {
    /// Show every canonical field and its synonyms
    List {
        #[arg(long)]
        json: bool,
    },
    /// Record a synonym for a canonical field
    Add { canonical: String, synonym: String },
    /// Add a canonical field
    New { name: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum PositionArg {
    Start,
    End,
    Replace,
}

impl From<PositionArg> for Position {
    fn from(p: PositionArg) -> Self {
        match p {
            PositionArg::Start => Position::Start,
            PositionArg::End => Position::End,
            PositionArg::Replace => Position::Replace,
        }
    }
}

type HashingSimilarity = EmbeddingSimilarity<HashingEmbedder>;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("FORMWRIGHT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };
    let store = JsonDictionaryStore::new(&cli.dict);

    match cli.command {
        Commands::Detect { args } => cmd_detect(&args, color),
        Commands::Review { args, threshold, accept } => cmd_review(&args, threshold, accept, &store, color),
        Commands::Dict { command } => cmd_dict(command, &store, color),
        Commands::Keys { data } => cmd_keys(&data),
        Commands::Fill { data, templates, out, name_column } => cmd_fill(&data, &templates, &out, name_column),
        Commands::Template { args, mappings, out } => cmd_template(&args, &mappings, &out),
        Commands::Insert { document, path, key, position, out } => {
            cmd_insert(&document, &path, &key, position.into(), &out)
        }
    }
}

fn load_document(path: &Path) -> Result<Document> {
    Document::open(path).with_context(|| format!("cannot load document '{}'", path.display()))
}

fn options_for(args: &DetectArgs) -> Result<Options> {
    let mut options = Options::default();
    if let Some(path) = &args.keywords {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("cannot read keywords '{}'", path.display()))?;
        options.keywords = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
    }
    Ok(options)
}

fn cmd_detect(args: &DetectArgs, color: bool) -> Result<()> {
    let options = options_for(args)?;
    let document = load_document(&args.document)?;
    let report = detect_fields_verbose(&document, &options);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        debug_report::print_detection(&args.document.display().to_string(), &report, color);
    }
    Ok(())
}

fn cmd_review(
    args: &DetectArgs,
    threshold: f32,
    accept: bool,
    store: &JsonDictionaryStore,
    color: bool,
) -> Result<()> {
    let options = Options { threshold, ..options_for(args)? };
    let document = load_document(&args.document)?;
    let names = detect_fields_verbose(&document, &options).names();

    let dictionary = store.load();
    let resolver = SynonymResolver::from_options(HashingSimilarity::default(), &options);
    let items = review_candidates(&names, &dictionary, &resolver);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        debug_report::print_review(&items, color);
    }

    if accept {
        let decisions: Vec<_> = items.iter().filter_map(|item| item.accept()).collect();
        let (dictionary, changed) = apply_review(dictionary, decisions);
        if changed {
            store.save(&dictionary)?;
            tracing::info!(path = %store.path().display(), "dictionary updated");
            eprintln!("dictionary saved to {}", store.path().display());
        }
    }
    Ok(())
}

fn cmd_dict(command: DictCommands, store: &JsonDictionaryStore, color: bool) -> Result<()> {
    let mut dictionary: Dictionary = store.load();
    let changed = match command {
        DictCommands::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&dictionary)?);
            } else {
                debug_report::print_dictionary(&dictionary, color);
            }
            false
        }
        DictCommands::Add { canonical, synonym } => dictionary.add_synonym(canonical, synonym),
        DictCommands::New { name } => {
            if name.trim().is_empty() {
                bail!("field name must not be empty");
            }
            dictionary.insert_field(name)
        }
    };
    if changed {
        store.save(&dictionary)?;
    }
    Ok(())
}

fn cmd_keys(data: &Path) -> Result<()> {
    let set = DataSet::open(data).with_context(|| format!("cannot load data '{}'", data.display()))?;
    for column in set.columns() {
        println!("{}", placeholder_for(column));
    }
    Ok(())
}

fn cmd_fill(data: &Path, templates: &[PathBuf], out: &Path, name_column: String) -> Result<()> {
    let set = DataSet::open(data).with_context(|| format!("cannot load data '{}'", data.display()))?;
    let names = template_names(templates)?;
    let templates = templates
        .iter()
        .zip(names)
        .map(|(path, name)| Ok(NamedTemplate { name, document: load_document(path)? }))
        .collect::<Result<Vec<_>>>()?;

    std::fs::create_dir_all(out).with_context(|| format!("cannot create '{}'", out.display()))?;
    let filled = fill_batch(&templates, &set, &Naming { name_column }, &Options::default());
    for doc in &filled {
        let target = out.join(&doc.file_name);
        doc.document.save(&target)?;

        let left: Vec<String> = formwright::blocks(&doc.document, Options::default().max_depth)
            .iter()
            .flat_map(|b| remaining_placeholders(&b.text))
            .collect();
        if !left.is_empty() {
            tracing::warn!(file = %doc.file_name, fields = ?left, "placeholders left unfilled");
        }
        println!("{}", target.display());
    }
    Ok(())
}

/// File names of `templates`, which end up in every output name and so must
/// be distinct.
fn template_names(templates: &[PathBuf]) -> Result<Vec<String>> {
    let mut seen: IndexMap<String, &Path> = IndexMap::new();
    for path in templates {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if name.is_empty() {
            bail!("template '{}' has no file name", path.display());
        }
        if let Some(first) = seen.insert(name.clone(), path) {
            bail!("templates '{}' and '{}' share the name '{name}'", first.display(), path.display());
        }
    }
    Ok(seen.into_keys().collect())
}

fn parse_mappings(mappings: &[String]) -> Result<IndexMap<String, String>> {
    mappings
        .iter()
        .map(|m| match m.split_once('=') {
            Some((label, key)) if !label.trim().is_empty() => Ok((label.trim().to_string(), key.trim().to_string())),
            _ => bail!("invalid mapping '{m}' (expected LABEL=KEY)"),
        })
        .collect()
}

fn cmd_template(args: &DetectArgs, mappings: &[String], out: &Path) -> Result<()> {
    let options = options_for(args)?;
    let mut document = load_document(&args.document)?;
    let mapping = if mappings.is_empty() {
        detect_fields_verbose(&document, &options).names().into_iter().map(|n| (n.clone(), n)).collect()
    } else {
        parse_mappings(mappings)?
    };

    let changed = templatize(&mut document, &mapping, options.max_depth);
    document.save(out)?;
    eprintln!("{changed} paragraph(s) rewritten, saved to {}", out.display());
    Ok(())
}

fn cmd_insert(document: &Path, path: &str, key: &str, position: Position, out: &Path) -> Result<()> {
    if key.trim().is_empty() {
        bail!("key must not be empty");
    }
    let mut doc = load_document(document)?;
    let path: BlockPath = path.parse()?;
    insert_placeholder(&mut doc, &path, position, key.trim())?;
    doc.save(out)?;
    eprintln!("{} inserted at {path}, saved to {}", placeholder_for(key.trim()), out.display());
    Ok(())
}
