use clap::{ArgAction, Parser, Subcommand};
use miette::Result;
use rubric_codegen::WriterMode;
use rubric_driver::Driver;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rubric")]
#[command(author, version, about = "Generate Rice bindings for C++ libraries")]
struct Cli {
    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the extension sources described by a rubric.toml
    Generate {
        /// Configuration file
        #[arg(default_value = "rubric.toml")]
        config: PathBuf,

        /// Output directory (overrides `extension.working_dir`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output layout (overrides `extension.writer`)
        #[arg(long)]
        writer: Option<WriterArg>,
    },

    /// Run a generation without writing anything
    Check {
        /// Configuration file
        #[arg(default_value = "rubric.toml")]
        config: PathBuf,
    },

    /// Print the declarations read from headers as JSON
    Dump {
        /// Headers to read
        #[arg(required = true)]
        headers: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum WriterArg {
    /// Everything in `<name>.rb.cpp`
    Single,
    /// One file pair per top-level class or module
    Multiple,
}

impl From<WriterArg> for WriterMode {
    fn from(arg: WriterArg) -> Self {
        match arg {
            WriterArg::Single => WriterMode::Single,
            WriterArg::Multiple => WriterMode::Multiple,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            config,
            output,
            writer,
        } => {
            let mut driver = Driver::from_config_file(&config)?;
            if let Some(output) = output {
                driver = driver.with_output(output);
            }
            if let Some(writer) = writer {
                driver = driver.with_writer(writer.into());
            }

            for path in driver.run()? {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Check { config } => {
            let driver = Driver::from_config_file(&config)?;
            let files = driver.generate()?;
            println!("{}: OK ({} files)", config.display(), files.len());
        }

        Commands::Dump { headers } => {
            let decls = rubric_frontend_cpp::read_headers(&headers)?;
            let json = decls.to_json()?;
            println!("{}", json);
        }
    }

    Ok(())
}
