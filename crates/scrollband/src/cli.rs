use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "scrollband",
    author,
    version,
    about = "Scrolling colour-band compute pattern",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags that override values from the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Config file to load instead of `<config dir>/config.toml`.
    #[arg(long, global = true, value_name = "FILE", env = "SCROLLBAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Workgroup counts per axis (each workgroup covers 10x10 pixels).
    #[arg(long, global = true, value_name = "XxY", value_parser = parse_dimensions)]
    pub workgroups: Option<(u32, u32)>,

    /// Output texture size; defaults to the grid extent.
    #[arg(long, global = true, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub surface: Option<(u32, u32)>,

    /// Horizontal scroll speed in pixels per second.
    #[arg(long, global = true, value_name = "PIXELS", allow_negative_numbers = true, value_parser = parse_finite)]
    pub speed: Option<f32>,

    /// Period of the red ramp in pixels.
    #[arg(long, global = true, value_name = "PIXELS", value_parser = parse_positive)]
    pub band_width: Option<f32>,

    /// Multiplier applied to elapsed time in the preview window.
    #[arg(long, global = true, value_name = "SCALE", allow_negative_numbers = true, value_parser = parse_finite)]
    pub time_scale: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the animated preview window (the default).
    Window,
    /// Render one frame and write it to a PNG or EXR file.
    Still(StillArgs),
    /// Print the colour the kernel produces for one pixel.
    Sample(SampleArgs),
    /// Print the resolved configuration paths.
    Where,
}

#[derive(Args, Debug)]
pub struct StillArgs {
    /// Time value handed to the kernel, in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0, allow_negative_numbers = true, value_parser = parse_finite)]
    pub time: f32,

    /// Destination file; the extension selects PNG or EXR.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Evaluate on the CPU instead of the GPU.
    #[arg(long)]
    pub cpu: bool,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[arg(long)]
    pub x: u32,

    #[arg(long)]
    pub y: u32,

    /// Time value handed to the kernel, in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0, allow_negative_numbers = true, value_parser = parse_finite)]
    pub time: f32,

    /// Emit a JSON object instead of plain text.
    #[arg(long)]
    pub json: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

fn parse_finite(value: &str) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid number '{value}'"))?;
    if !parsed.is_finite() {
        return Err("value must be finite".into());
    }
    Ok(parsed)
}

fn parse_positive(value: &str) -> Result<f32, String> {
    let parsed = parse_finite(value)?;
    if parsed <= 0.0 {
        return Err("value must be greater than zero".into());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dimension_pairs() {
        assert_eq!(parse_dimensions("100x100").unwrap(), (100, 100));
        assert_eq!(parse_dimensions(" 4 X 3 ").unwrap(), (4, 3));
        assert!(parse_dimensions("0x10").is_err());
        assert!(parse_dimensions("10").is_err());
        assert!(parse_dimensions("ax10").is_err());
    }

    #[test]
    fn band_width_must_be_positive() {
        assert_eq!(parse_positive("1000").unwrap(), 1000.0);
        assert!(parse_positive("0").is_err());
        assert!(parse_positive("-5").is_err());
        assert!(parse_finite("inf").is_err());
        assert!(parse_finite("NaN").is_err());
    }

    #[test]
    fn no_subcommand_means_window() {
        let cli = Cli::try_parse_from(["scrollband", "--speed", "-50"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.overrides.speed, Some(-50.0));
    }

    #[test]
    fn global_overrides_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "scrollband",
            "sample",
            "--x",
            "500",
            "--y",
            "250",
            "--time",
            "-1",
            "--workgroups",
            "4x3",
        ])
        .unwrap();
        assert_eq!(cli.overrides.workgroups, Some((4, 3)));
        match cli.command {
            Some(Command::Sample(args)) => {
                assert_eq!((args.x, args.y), (500, 250));
                assert_eq!(args.time, -1.0);
                assert!(!args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn still_requires_output() {
        assert!(Cli::try_parse_from(["scrollband", "still", "--time", "2"]).is_err());
        let cli = Cli::try_parse_from(["scrollband", "still", "-o", "frame.png", "--cpu"]).unwrap();
        match cli.command {
            Some(Command::Still(args)) => {
                assert!(args.cpu);
                assert_eq!(args.time, 0.0);
                assert_eq!(args.output, PathBuf::from("frame.png"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
