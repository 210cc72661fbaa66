#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("survey_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;
    use std::path::Path;

    use survey_engine::config::EngineConfig;
    use survey_engine::parse::{self, ImportFormat};
    use survey_engine::survey::Survey;
    use survey_engine::{geom, ident};

    const USAGE: &str = r#"survey_cli (survey-engine)

USAGE:
  survey_cli formats
  survey_cli import <file> [options]
  survey_cli id <region> <district> [sequence]
  survey_cli circle <radius_m>

OPTIONS (import):
  --json             Print the boundary payload instead of statistics
  --config <path>    Engine configuration (JSON)
  -h, --help         Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "formats" => {
                print_formats();
                Ok(())
            }
            "import" => cmd_import(&mut args),
            "id" => cmd_id(&mut args),
            "circle" => cmd_circle(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_formats() {
        for extension in ImportFormat::EXTENSIONS {
            let Ok(format) = ImportFormat::from_extension(extension) else {
                continue;
            };
            let kind = if format.is_synthetic() { " (placeholder)" } else { "" };
            println!(".{extension:<8} {format}{kind}");
        }
    }

    fn cmd_import(args: &mut Args) -> Result<(), String> {
        let file = args.next().ok_or("missing input file")?;

        let mut as_json = false;
        let mut config = EngineConfig::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => as_json = true,
                "--config" => config = load_config(Path::new(&args.value("--config")?))?,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let path = Path::new(&file);
        let raw = fs::read(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| format!("{} has no file extension", path.display()))?;

        let imported = parse::import(&raw, extension, &config.import).map_err(|e| e.to_string())?;
        if imported.is_synthetic() {
            eprintln!("note: {} is not decoded; a placeholder rectangle is used", imported.source_tag());
        }

        let mut survey = Survey::new();
        survey.apply_import(imported);

        if as_json {
            let payload = serde_json::to_string_pretty(&survey.payload()).map_err(|e| e.to_string())?;
            println!("{payload}");
            return Ok(());
        }

        let stats = survey.statistics();
        println!("source:      {}", survey.data_source());
        println!("instrument:  {}", survey.instrument_type());
        if let Some(accuracy) = survey.declared_accuracy() {
            println!("accuracy:    {accuracy:.2}");
        }
        println!("points:      {}", stats.point_count);
        println!("area:        {:.2} m² ({:.4} ha, {:.4} ac)", stats.area_m2, stats.area_hectares, stats.area_acres);
        if let Some(centroid) = stats.centroid {
            println!("centroid:    {:.6}, {:.6}", centroid.lat, centroid.lng);
        }
        Ok(())
    }

    fn cmd_id(args: &mut Args) -> Result<(), String> {
        let region = args.next().ok_or("missing region")?;
        let district = args.next().ok_or("missing district")?;
        let sequence = args
            .next()
            .map(|value| value.parse::<u32>().map_err(|e| format!("invalid sequence `{value}`: {e}")))
            .transpose()?;
        if let Some(extra) = args.next() {
            return Err(format!("unexpected argument `{extra}`"));
        }

        println!("{}", ident::generate(&region, &district, sequence));
        Ok(())
    }

    fn cmd_circle(args: &mut Args) -> Result<(), String> {
        let radius = args.next().ok_or("missing radius")?;
        let radius: f64 = radius.parse().map_err(|e| format!("invalid radius `{radius}`: {e}"))?;
        println!("{:.2}", geom::compute_circle_area(radius));
        Ok(())
    }

    fn load_config(path: &Path) -> Result<EngineConfig, String> {
        let text = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
        EngineConfig::from_json(&text).map_err(|e| e.to_string())
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
