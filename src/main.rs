//! MiaoCarb command-line tool
//!
//! Reads pet food labels, scores them for a diabetic cat and keeps a local
//! catalog of analysed foods.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use miaocarb::catalog::{share_summary, Catalog};
use miaocarb::config::AppConfig;
use miaocarb::label::NutrientExtractor;
use miaocarb::nutrition::{advisories, AnalysisResult, FoodComposition, FoodType};
use miaocarb::ocr::{ensure_tesseract, RelativeRect, TesseractEngine};
use miaocarb::profile::{CatProfile, Goal, NeuterStatus};
use miaocarb::store::{FileBlobStore, JsonFileStore};
use miaocarb::{log, paths, Session, SessionStage};

#[derive(Parser)]
#[command(name = "miaocarb", version, about = "Pet food analysis for diabetic cats")]
struct Cli {
    /// Data directory (default: local data dir/miaocarb)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read nutrient values from a label photo
    ReadLabel {
        photo: PathBuf,
        /// Relative crop "x,y,width,height", e.g. 0,0.5,1,0.5
        #[arg(long)]
        crop: Option<RelativeRect>,
    },
    /// Score a food from a label photo and/or typed-in values
    Analyze(AnalyzeArgs),
    /// Saved foods
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// The cat's profile
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args)]
struct AnalyzeArgs {
    #[arg(long)]
    name: String,
    #[arg(long = "type", value_enum)]
    food_type: FoodTypeArg,
    /// Label photo to read values from
    #[arg(long)]
    label: Option<PathBuf>,
    /// Relative crop of the label photo
    #[arg(long)]
    crop: Option<RelativeRect>,
    /// Front-of-pack photo to keep with the entry
    #[arg(long)]
    front: Option<PathBuf>,
    /// Typed-in values override what was read from the label
    #[arg(long)]
    protein: Option<f64>,
    #[arg(long)]
    fat: Option<f64>,
    #[arg(long)]
    fiber: Option<f64>,
    #[arg(long)]
    moisture: Option<f64>,
    #[arg(long)]
    ash: Option<f64>,
    /// Energy, kcal per 100 g
    #[arg(long)]
    kcal: Option<f64>,
    /// Save the result to the catalog
    #[arg(long)]
    save: bool,
    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// List saved foods, most recent first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved food and its photos
    Delete { index: usize },
    /// Print a shareable summary of a saved food
    Share { index: usize },
    /// Delete photos no saved food uses
    CleanupImages {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Create or replace the profile
    Set {
        /// Current weight, kg
        #[arg(long)]
        weight: f64,
        /// Ideal weight, kg (default: current weight)
        #[arg(long)]
        ideal_weight: Option<f64>,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, value_enum, default_value_t = StatusArg::Neutered)]
        status: StatusArg,
        #[arg(long, value_enum, default_value_t = GoalArg::Maintenance)]
        goal: GoalArg,
        #[arg(long)]
        on_insulin: bool,
    },
    Show,
    /// Delete the profile (saved foods are kept)
    Delete,
}

#[derive(Clone, Copy, ValueEnum)]
enum FoodTypeArg {
    Dry,
    Wet,
}

impl From<FoodTypeArg> for FoodType {
    fn from(arg: FoodTypeArg) -> Self {
        match arg {
            FoodTypeArg::Dry => FoodType::Dry,
            FoodTypeArg::Wet => FoodType::Wet,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusArg {
    Neutered,
    Intact,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GoalArg {
    Maintenance,
    WeightLoss,
}

/// Everything a command needs, opened once at startup.
struct App {
    config: AppConfig,
    kv: JsonFileStore,
    blobs: FileBlobStore,
}

impl App {
    fn catalog(&self) -> Catalog<'_> {
        Catalog::new(&self.kv, &self.blobs)
    }

    fn profile(&self) -> Option<CatProfile> {
        CatProfile::load(&self.kv)
    }
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();

    paths::init_data_dir(cli.data_dir);
    paths::ensure_directories().context("Failed to create data directories")?;

    let config = AppConfig::load(&paths::get_config_path());
    let kv = match config.storage_quota_bytes {
        Some(quota) => JsonFileStore::with_quota(paths::get_store_dir(), quota),
        None => JsonFileStore::new(paths::get_store_dir()),
    };
    let app = App {
        kv,
        blobs: FileBlobStore::new(paths::get_images_dir()),
        config,
    };

    match cli.command {
        Command::ReadLabel { photo, crop } => read_label(&app, &photo, crop.as_ref()),
        Command::Analyze(args) => analyze(&app, args),
        Command::Catalog(command) => catalog(&app, command),
        Command::Profile(command) => profile(&app, command),
    }
}

fn read_photo(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read photo {}", path.display()))
}

fn recognizer(config: &AppConfig) -> Result<TesseractEngine> {
    let paths = ensure_tesseract(config)?;
    Ok(TesseractEngine::new(paths, config.page_segmentation_mode))
}

fn progress_printer() -> impl FnMut(u8) {
    |percent| log(&format!("Reading... {}%", percent))
}

fn read_label(app: &App, photo: &Path, crop: Option<&RelativeRect>) -> Result<()> {
    let engine = recognizer(&app.config)?;
    let extractor = NutrientExtractor::new().context("Failed to compile label patterns")?;

    let mut session = Session::new(app.config.clone());
    session.attach_label_photo(&read_photo(photo)?);

    let extracted = session
        .read_label(&engine, &extractor, crop, &mut progress_printer())
        .map_err(|e| anyhow!("{}\n{}", e, e.guidance()))?;

    println!("{}", serde_json::to_string_pretty(extracted)?);
    let missing = extracted.missing();
    if !missing.is_empty() {
        let names: Vec<_> = missing.iter().map(|k| k.as_str()).collect();
        println!("Not found, enter manually: {}", names.join(", "));
    }
    Ok(())
}

fn analyze(app: &App, args: AnalyzeArgs) -> Result<()> {
    let mut session = Session::new(app.config.clone());

    if let Some(front) = &args.front {
        session.attach_front_photo(&read_photo(front)?);
    }

    match &args.label {
        Some(label) => {
            session.attach_label_photo(&read_photo(label)?);
            let extractor = NutrientExtractor::new().context("Failed to compile label patterns")?;
            match recognizer(&app.config) {
                Ok(engine) => {
                    if let Err(e) = session.read_label(
                        &engine,
                        &extractor,
                        args.crop.as_ref(),
                        &mut progress_printer(),
                    ) {
                        eprintln!("Could not read the label: {}\n{}", e, e.guidance());
                    }
                }
                Err(e) => {
                    log(&format!("OCR unavailable: {}", e));
                    session.enter_manually();
                }
            }
        }
        None => session.enter_manually(),
    }

    if session.stage() == SessionStage::AwaitingManualInput {
        log(session.stage().status_text());
    }

    let mut food = session.prefill(&args.name, args.food_type.into());
    apply_overrides(&mut food, &args);

    let profile = app.profile();
    let result = session.analyze(&food)?.clone();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, profile.as_ref());
    }

    if args.save {
        match session.save(&app.catalog()) {
            Ok(_) => println!("Saved to catalog."),
            Err(e) if e.is_quota() => {
                return Err(anyhow!(
                    "{}\nStorage is full: delete some foods or run `miaocarb catalog cleanup-images`.",
                    e
                ));
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn apply_overrides(food: &mut FoodComposition, args: &AnalyzeArgs) {
    let required = [
        (&mut food.protein, args.protein),
        (&mut food.fat, args.fat),
        (&mut food.fiber, args.fiber),
        (&mut food.moisture, args.moisture),
    ];
    for (slot, value) in required {
        if let Some(value) = value {
            *slot = value;
        }
    }
    if args.ash.is_some() {
        food.ash = args.ash;
    }
    if args.kcal.is_some() {
        food.kcal_per_100g = args.kcal;
    }
}

fn print_result(result: &AnalysisResult, profile: Option<&CatProfile>) {
    println!("{}", result.name);
    println!(
        "{} - {}",
        result.overall_score.title(),
        result.overall_score.summary()
    );
    println!(
        "Carbohydrates: {:.1}% ME, {:.1} g/100 kcal ({:?})",
        result.carbs_me, result.carbs_per_100kcal, result.carb_score
    );
    println!(
        "Protein: {:.1}% ME, {:.1} g/100 kcal ({:?})",
        result.protein_me, result.protein_per_100kcal, result.protein_score
    );
    println!(
        "Energy: {:.0} kcal/100 g{}",
        result.kcal_per_100g,
        if result.kcal_estimated { " (estimated)" } else { "" }
    );
    if result.ash_estimated {
        println!("Ash not declared, assumed {:.1}%", result.ash);
    }
    println!("Confidence: {:?}", result.confidence);

    if let Some(profile) = profile {
        println!(
            "Daily portion for {}: {:.0} g",
            profile.name,
            profile.daily_portion(result.kcal_per_100g)
        );
    }
    for advisory in advisories(result, profile) {
        println!("! {}", advisory.message());
    }
}

fn catalog(app: &App, command: CatalogCommand) -> Result<()> {
    let catalog = app.catalog();

    match command {
        CatalogCommand::List { json } => {
            let entries = catalog.entries();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if entries.is_empty() {
                println!("The catalog is empty. Analyze a food with --save to add one.");
                return Ok(());
            }
            let profile = app.profile();
            for (index, entry) in entries.iter().enumerate() {
                let portion = profile
                    .as_ref()
                    .map(|p| format!(", {:.0} g/day", p.daily_portion(entry.kcal_per_100g)))
                    .unwrap_or_default();
                println!(
                    "{:>3}  {} ({}, {:.0} kcal/100 g) {}{}",
                    index,
                    entry.name,
                    entry.food_type,
                    entry.kcal_per_100g,
                    entry.overall_score.title(),
                    portion
                );
            }
        }
        CatalogCommand::Delete { index } => {
            let removed = catalog.delete(index)?;
            println!("Deleted {}.", removed.name);
        }
        CatalogCommand::Share { index } => {
            let entries = catalog.entries();
            let entry = entries
                .get(index)
                .ok_or_else(|| anyhow!("No catalog entry at position {}", index))?;
            println!("{}", share_summary(entry, app.profile().as_ref()));
        }
        CatalogCommand::CleanupImages { yes } => {
            let orphans = catalog.orphan_images()?;
            if orphans.is_empty() {
                println!("No unused images found.");
                return Ok(());
            }
            if !yes && !confirm(&format!(
                "Found {} unused images. Delete them to free up space?",
                orphans.len()
            ))? {
                return Ok(());
            }
            let removed = catalog.remove_images(&orphans);
            println!("Cleanup complete: deleted {} images.", removed);
        }
    }

    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn profile(app: &App, command: ProfileCommand) -> Result<()> {
    match command {
        ProfileCommand::Set {
            weight,
            ideal_weight,
            name,
            status,
            goal,
            on_insulin,
        } => {
            let status = match status {
                StatusArg::Neutered => NeuterStatus::Neutered,
                StatusArg::Intact => NeuterStatus::Intact,
            };
            let goal = match goal {
                GoalArg::Maintenance => Goal::Maintenance,
                GoalArg::WeightLoss => Goal::WeightLoss,
            };
            let profile = CatProfile::new(&name, weight, ideal_weight, status, goal, on_insulin)?;
            profile.save(&app.kv).context("Failed to save profile")?;
            print_profile(&profile);
        }
        ProfileCommand::Show => match app.profile() {
            Some(profile) => print_profile(&profile),
            None => println!("No profile yet. Create one with `miaocarb profile set --weight <kg>`."),
        },
        ProfileCommand::Delete => {
            CatProfile::delete(&app.kv).context("Failed to delete profile")?;
            println!("Profile deleted. Saved foods were kept.");
        }
    }
    Ok(())
}

fn print_profile(profile: &CatProfile) {
    println!("{} - {} kg (ideal {} kg)", profile.name, profile.current_weight, profile.ideal_weight);
    println!(
        "{:.0} kcal/day (RER {:.0} kcal, {})",
        profile.target_kcal,
        profile.rer,
        match profile.goal {
            Goal::Maintenance => "maintenance",
            Goal::WeightLoss => "weight loss",
        }
    );
    if profile.on_insulin {
        println!("! On insulin: consult the vet before changing diet.");
    }
}
