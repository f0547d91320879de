// storybook-audio: play a narrated scene from the command line
use storybook_audio::args::CliArgs;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let args = CliArgs::parse(std::env::args().skip(1));
    if args.show_help {
        CliArgs::print_help();
        std::process::exit(2);
    }

    storybook_audio::run(args)
}
