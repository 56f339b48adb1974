use std::fmt;

use fitness_core::model::{ExerciseDraft, FoodDraft, MuscleGroup, Nutrients};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    force: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("FITNESS_DB_URL").unwrap_or_else(|_| "sqlite:fitness.sqlite3".into());
        let mut force = false;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--force" => force = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, force })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   SQLite URL (default: sqlite:fitness.sqlite3)");
    eprintln!("  --force             Insert the catalog even if entries already exist");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FITNESS_DB_URL      same as --db");
    eprintln!("  RUST_LOG            log filter (default: info)");
}

const EXERCISES: &[(&str, MuscleGroup, &str)] = &[
    ("Press de banca", MuscleGroup::Chest, "Empuje horizontal con barra en banco plano."),
    ("Flexiones", MuscleGroup::Chest, "Empuje con el peso corporal."),
    ("Dominadas", MuscleGroup::Back, "Tirón vertical colgado de una barra."),
    ("Remo con barra", MuscleGroup::Back, "Tirón horizontal con el torso inclinado."),
    ("Press militar", MuscleGroup::Shoulders, "Empuje vertical de pie con barra."),
    ("Curl de bíceps", MuscleGroup::Biceps, "Flexión de codo con mancuernas."),
    ("Fondos en paralelas", MuscleGroup::Triceps, "Extensión de codo con el peso corporal."),
    ("Sentadilla", MuscleGroup::Legs, "Flexión de cadera y rodilla con barra."),
    ("Peso muerto", MuscleGroup::Legs, "Bisagra de cadera desde el suelo."),
    ("Plancha", MuscleGroup::Abs, "Isometría en posición de flexión."),
    ("Carrera continua", MuscleGroup::Cardio, "Trote a ritmo constante."),
];

/// Name, then calories, protein, carbs and fat per 100 g.
const FOODS: &[(&str, f64, f64, f64, f64)] = &[
    ("Arroz blanco cocido", 130.0, 2.7, 28.0, 0.3),
    ("Pechuga de pollo", 165.0, 31.0, 0.0, 3.6),
    ("Huevo", 155.0, 13.0, 1.1, 11.0),
    ("Avena", 389.0, 16.9, 66.3, 6.9),
    ("Plátano", 89.0, 1.1, 22.8, 0.3),
    ("Manzana", 52.0, 0.3, 13.8, 0.2),
    ("Leche entera", 61.0, 3.2, 4.8, 3.3),
    ("Aceite de oliva", 884.0, 0.0, 0.0, 100.0),
    ("Salmón", 208.0, 20.0, 0.0, 13.0),
    ("Lentejas cocidas", 116.0, 9.0, 20.0, 0.4),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let has_exercises = !storage.exercises.list_exercises(None).await?.is_empty();
    let has_foods = !storage.foods.list_foods().await?.is_empty();

    let mut exercises = 0;
    if args.force || !has_exercises {
        for (name, muscle_group, description) in EXERCISES {
            let exercise = ExerciseDraft {
                name: (*name).to_string(),
                muscle_group: *muscle_group,
                description: Some((*description).to_string()),
                instructions: None,
                video_url: None,
                image_url: None,
            }
            .validate()?;
            storage.exercises.insert_exercise(exercise).await?;
            exercises += 1;
        }
    } else {
        info!("exercise catalog already populated, skipping");
    }

    let mut foods = 0;
    if args.force || !has_foods {
        for (name, calories, protein, carbs, fat) in FOODS {
            let food = FoodDraft {
                name: (*name).to_string(),
                per_100g: Nutrients {
                    calories: *calories,
                    protein: *protein,
                    carbs: *carbs,
                    fat: *fat,
                },
            }
            .validate()?;
            storage.foods.insert_food(food).await?;
            foods += 1;
        }
    } else {
        info!("food catalog already populated, skipping");
    }

    info!(exercises, foods, db = %args.db_url, "seeded catalog");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
