// Posts a random xkcd comic (strictly older than the current one) to
// the group wall. Mirrors `post_latest` apart from the mode.

use indicatif::{ProgressBar, ProgressStyle};

use xkcd_vk_cli::comic::ComicClient;
use xkcd_vk_cli::config::VkConfig;
use xkcd_vk_cli::pipeline::{Mode, Pipeline};
use xkcd_vk_cli::vk::VkClient;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = VkConfig::from_env()?;
    let pipeline = Pipeline::new(ComicClient::new(), VkClient::new(config));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message("Posting a random comic...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let post_id = pipeline.run(Mode::Random)?;
    spinner.finish_and_clear();
    println!("Posted wall post {}", post_id);
    Ok(())
}
