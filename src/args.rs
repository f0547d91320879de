// Command-line arguments for the storybook-audio player
use std::path::PathBuf;

/// Parsed command-line arguments
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    /// Directory holding settings.json, catalog.json and assets/
    pub data_dir: Option<PathBuf>,
    /// Background music cue
    pub bgm: Option<String>,
    /// Ambient loop cue
    pub ambient: Option<String>,
    /// Overrides (and saves) the volume before anything plays
    pub volume: Option<i32>,
    /// Overrides (and saves) the mute flag
    pub muted: Option<bool>,
    /// Overrides (and saves) the screen brightness
    pub brightness: Option<i32>,
    /// Overrides (and saves) the story text size
    pub text_size: Option<i32>,
    /// Voice cues narrated in order
    pub voices: Vec<String>,
    pub show_help: bool,
}

impl CliArgs {
    /// Parse arguments (without the program name)
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => parsed.show_help = true,
                "--mute" => parsed.muted = Some(true),
                "--unmute" => parsed.muted = Some(false),
                "--bgm" | "--ambient" | "--volume" | "--brightness" | "--text-size" => {
                    let Some(value) = iter.next() else {
                        eprintln!("{} requires an argument", arg);
                        parsed.show_help = true;
                        continue;
                    };
                    match arg.as_str() {
                        "--bgm" => parsed.bgm = Some(value),
                        "--ambient" => parsed.ambient = Some(value),
                        flag => match value.parse::<i32>() {
                            Ok(n) if flag == "--volume" => parsed.volume = Some(n),
                            Ok(n) if flag == "--brightness" => parsed.brightness = Some(n),
                            Ok(n) => parsed.text_size = Some(n),
                            Err(_) => {
                                eprintln!("Invalid value for {}: {}", flag, value);
                                parsed.show_help = true;
                            }
                        },
                    }
                }
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    parsed.show_help = true;
                }
                _ if parsed.data_dir.is_none() => parsed.data_dir = Some(PathBuf::from(arg)),
                _ => parsed.voices.push(arg),
            }
        }

        if parsed.data_dir.is_none() {
            parsed.show_help = true;
        }
        parsed
    }

    /// Print help text to stderr
    pub fn print_help() {
        eprintln!(
            "Usage:\n  storybook-audio <data-dir> [--bgm NAME] [--ambient NAME] [--volume N] [--mute|--unmute]\n\
             \x20                 [--brightness N] [--text-size N] [VOICE_CUE...]\n\n\
             Flags:\n\
             \x20 --bgm NAME       Background music cue to loop under the narration\n\
             \x20 --ambient NAME   Ambient loop cue\n\
             \x20 --volume N       Set and save the volume (0-100)\n\
             \x20 --mute/--unmute  Set and save the mute flag\n\
             \x20 --brightness N   Set and save the screen brightness (50-100)\n\
             \x20 --text-size N    Set and save the text size (80-200)\n\
             \x20 -h, --help       Show this help\n\n\
             The data directory holds settings.json, catalog.json and assets/.\n"
        );
    }
}
