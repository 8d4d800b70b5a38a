use clap::{CommandFactory, Parser};
use rawdo::librawdo::{
    Companding, ConversionParams, HistoryBackend, HistoryStore, JsonFileBackend, MediaDescriptor,
    MemoryBackend, PaddingPolicy, PixelMode, SUPPORTED_SAMPLE_RATES,
};
use rawdo::{ConversionReport, ConvertError, Converter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const EXIT_INPUT: u8 = 1;
const EXIT_OUTPUT: u8 = 2;

#[derive(Parser)]
#[command(name = "rawdo")]
#[command(version)]
#[command(about = "Audio/image converter using a raw approach", long_about = None)]
struct Cli {
    /// Input file (audio or image)
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Output file; its extension selects the image format, audio is always written as WAV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sample rate of the produced audio
    #[arg(long, value_parser = parse_bitrate, help_heading = "Image to audio options")]
    bitrate: Option<u32>,
    /// Produce mono audio
    #[arg(long, group = "channel_layout", help_heading = "Image to audio options")]
    mono: bool,
    /// Produce stereo audio (default)
    #[arg(long, group = "channel_layout", help_heading = "Image to audio options")]
    stereo: bool,

    /// Image ratio, width / height (default 1.5)
    #[arg(short, long, group = "canvas", help_heading = "Audio to image options")]
    ratio: Option<f64>,
    /// Image width in pixels
    #[arg(short, long, group = "canvas", help_heading = "Audio to image options")]
    width: Option<u32>,
    /// Generate an RGB image (default)
    #[arg(long, group = "pixel_mode", help_heading = "Audio to image options")]
    rgb: bool,
    /// Generate a greyscale image
    #[arg(long, group = "pixel_mode", help_heading = "Audio to image options")]
    greyscale: bool,
    /// Generate an RGBA image
    #[arg(long, group = "pixel_mode", help_heading = "Audio to image options")]
    rgba: bool,

    /// Drop bytes that do not fill the output
    #[arg(long, group = "remainder", help_heading = "Conversion options")]
    truncate: bool,
    /// Pad the output with zero bytes (default)
    #[arg(long, group = "remainder", help_heading = "Conversion options")]
    add_extra_bytes: bool,
    /// No companding (default)
    #[arg(long, group = "method", help_heading = "Conversion options")]
    conversion_linear: bool,
    /// μ-law companding
    #[arg(long, group = "method", help_heading = "Conversion options")]
    conversion_u_law: bool,
    /// A-law companding
    #[arg(long, group = "method", help_heading = "Conversion options")]
    conversion_a_law: bool,
    /// μ-law expanding
    #[arg(long, group = "method", help_heading = "Conversion options")]
    conversion_inverse_u_law: bool,
    /// A-law expanding
    #[arg(long, group = "method", help_heading = "Conversion options")]
    conversion_inverse_a_law: bool,
    /// Do not infer parameters from previous conversions
    #[arg(long, help_heading = "Conversion options")]
    ignore_history: bool,
    /// History file location
    #[arg(long, env = "RAWDODENDRON_HISTORY", value_name = "PATH")]
    history_file: Option<PathBuf>,

    /// Verbose messages
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn params(&self) -> ConversionParams {
        let mut params = ConversionParams::new().ignoring_history(self.ignore_history);
        params.sample_rate = self.bitrate;

        if self.mono {
            params.channels = Some(1);
        } else if self.stereo {
            params.channels = Some(2);
        }

        if let Some(width) = self.width {
            params = params.with_width(width);
        } else if let Some(ratio) = self.ratio {
            params = params.with_ratio(ratio);
        }

        params.mode = if self.greyscale {
            Some(PixelMode::Greyscale)
        } else if self.rgba {
            Some(PixelMode::Rgba)
        } else if self.rgb {
            Some(PixelMode::Rgb)
        } else {
            None
        };

        if self.truncate {
            params.policy = Some(PaddingPolicy::Truncate);
        } else if self.add_extra_bytes {
            params.policy = Some(PaddingPolicy::Pad);
        }

        params.companding = [
            (self.conversion_linear, Companding::Linear),
            (self.conversion_u_law, Companding::ULaw),
            (self.conversion_a_law, Companding::ALaw),
            (self.conversion_inverse_u_law, Companding::InverseULaw),
            (self.conversion_inverse_a_law, Companding::InverseALaw),
        ]
        .into_iter()
        .find_map(|(set, method)| set.then_some(method));

        params
    }
}

fn parse_bitrate(s: &str) -> Result<u32, String> {
    let rate: u32 = s.parse().map_err(|_| format!("invalid sample rate: {}", s))?;
    if SUPPORTED_SAMPLE_RATES.contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("sample rate must be one of {:?}", SUPPORTED_SAMPLE_RATES))
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_INPUT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    let (input, output) = match (&cli.input, &cli.output) {
        (Some(input), Some(output)) => (input.clone(), output.clone()),
        (None, None) => {
            println!("Interactive mode is not available, use --input and --output");
            println!();
            print_help();
            return ExitCode::from(EXIT_INPUT);
        }
        _ => {
            println!("Error: input and output should be both defined");
            println!();
            print_help();
            return ExitCode::from(EXIT_INPUT);
        }
    };

    println!("Input file: {}", input.display());
    println!("Output file: {}", output.display());

    let mut converter = Converter::new(HistoryStore::new(history_backend(&cli)));
    match converter.convert(&input, &output, &cli.params()) {
        Ok(report) => {
            print_report(&report, cli.verbose);
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e, cli.verbose),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn history_backend(cli: &Cli) -> Box<dyn HistoryBackend> {
    if let Some(path) = &cli.history_file {
        return Box::new(JsonFileBackend::new(path));
    }
    match JsonFileBackend::default_location() {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!("history disabled for this run: {}", e);
            Box::new(MemoryBackend::new())
        }
    }
}

fn print_help() {
    let _ = Cli::command().print_help();
    println!();
}

fn report_error(e: &ConvertError, verbose: bool) -> ExitCode {
    match e {
        ConvertError::UnrecognizedInputFormat { audio, image, .. } => {
            println!("Error: unknown input format");
            println!();
            print_help();
            if verbose {
                println!();
                println!("  as audio: {}", audio);
                println!("  as image: {}", image);
            }
            ExitCode::from(EXIT_INPUT)
        }
        ConvertError::OutputEncodeFailure { .. } => {
            println!("Error while writing output file: {}", e);
            ExitCode::from(EXIT_OUTPUT)
        }
        ConvertError::Io { .. } | ConvertError::Shape(_) | ConvertError::StaleSourceItem { .. } => {
            println!("Error: {}", e);
            ExitCode::from(EXIT_INPUT)
        }
    }
}

fn print_report(report: &ConversionReport, verbose: bool) {
    if verbose {
        println!("{}", describe(&report.source));
        if report.params.from_history {
            println!("  (parameters completed from conversion history)");
        }
        println!(
            "  Companding: {}, remainder: {} byte(s) {}",
            report.params.companding,
            report.surplus.unsigned_abs(),
            if report.surplus < 0 { "dropped" } else { "added" }
        );
        if report.rgb_fallback {
            println!("  Alpha channel not supported by the output format, wrote RGB");
        }
        if !report.recorded {
            println!("  Conversion was not saved to history");
        }
    }

    println!("Done!");
    println!("  {}", describe(&report.target));
}

fn describe(descriptor: &MediaDescriptor) -> String {
    match descriptor {
        MediaDescriptor::Image(image) => format!(
            "Image size: {}px * {}px ({})",
            image.width, image.height, image.mode
        ),
        MediaDescriptor::Audio(audio) => format!(
            "Audio properties: channels: {}, sample_width: {}, frame_rate: {}, duration: {:.2}s",
            audio.channels,
            audio.sample_width,
            audio.sample_rate,
            audio.duration_secs()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_help_names_wav() {
        let command = Cli::command();
        let output = command
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == "output")
            .unwrap();
        assert!(output.get_help().unwrap().to_string().contains("WAV"));
    }

    #[test]
    fn test_bitrate_values() {
        assert_eq!(parse_bitrate("48000"), Ok(48000));
        assert!(parse_bitrate("22050").is_err());
        assert!(parse_bitrate("fast").is_err());
    }

    #[test]
    fn test_flags_to_params() {
        let cli = Cli::try_parse_from([
            "rawdo",
            "-i",
            "in.png",
            "-o",
            "out.wav",
            "--mono",
            "--truncate",
            "--conversion-a-law",
            "--width",
            "12",
        ])
        .unwrap();
        let params = cli.params();
        assert_eq!(params.channels, Some(1));
        assert_eq!(params.policy, Some(PaddingPolicy::Truncate));
        assert_eq!(params.companding, Some(Companding::ALaw));
        let expected = ConversionParams::new()
            .with_channels(1)
            .with_policy(PaddingPolicy::Truncate)
            .with_companding(Companding::ALaw)
            .with_width(12);
        assert_eq!(params, expected);
    }

    #[test]
    fn test_exclusive_flags() {
        assert!(Cli::try_parse_from(["rawdo", "--mono", "--stereo"]).is_err());
        assert!(Cli::try_parse_from(["rawdo", "--width", "3", "--ratio", "2"]).is_err());
        assert!(Cli::try_parse_from(["rawdo", "--bitrate", "8000"]).is_err());
    }
}
