//! Posts a local image to a running neuroscan server and prints the result.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Send a test image to a neuroscan prediction endpoint")]
struct Args {
    /// Path to the image to classify
    image: PathBuf,

    /// Disease endpoint to hit
    #[arg(long, default_value = "cancer")]
    disease: String,

    /// Server base URL
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    server: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let url = format!("{}/predict/{}", args.server, args.disease);

    let form = reqwest::blocking::multipart::Form::new().file("file", &args.image)?;
    let response = reqwest::blocking::Client::new()
        .post(&url)
        .multipart(form)
        .send()?;

    println!("Response status code: {}", response.status());
    let text = response.text()?;
    println!("Response content: {text}");

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{} prediction: {json}", args.disease),
        Err(_) => println!("Failed to parse JSON response"),
    }

    Ok(())
}
