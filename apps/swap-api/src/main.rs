use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = swap_api::Args::parse();

	swap_api::run(args).await
}
