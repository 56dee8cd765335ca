#![warn(clippy::all, rust_2018_idioms)]

use std::{collections::HashMap, time::Duration};

use clap::{Parser, Subcommand};
use subman_backend::{
    model::{PubsubMessageToPublish, SubscriptionName, TopicName},
    ManagerConfig, SubscriptionManager,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "subman", about = "Manage Google Cloud Pub/Sub subscriptions.")]
struct Args {
    /// Google Cloud project ID. Defaults to the authenticated project.
    #[arg(long, global = true)]
    project: Option<String>,

    /// Optional override for the Pub/Sub Emulator project ID.
    #[arg(long, global = true)]
    emulator_project_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a pull subscription if it does not already exist.
    CreatePull {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        subscription: String,
    },
    /// Create a push subscription if it does not already exist.
    CreatePush {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        subscription: String,
        /// Shared secret embedded in the push endpoint URL.
        #[arg(long)]
        token: String,
    },
    /// List all subscriptions in the project.
    List {
        /// Print the subscription names as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Delete a subscription.
    Delete {
        #[arg(long)]
        subscription: String,
    },
    /// Publish a single message to a topic.
    Publish {
        #[arg(long)]
        topic: String,
        /// Message payload.
        #[arg(long)]
        data: String,
        /// Message attribute as a KEY=VALUE pair. May be repeated.
        #[arg(long = "attr", value_parser = parse_key_val)]
        attributes: Vec<(String, String)>,
    },
    /// Receive and acknowledge messages for a bounded duration.
    Receive {
        #[arg(long)]
        subscription: String,
        /// Session length in seconds.
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("invalid KEY=VALUE attribute: {s}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let args = Args::parse();

    let manager = SubscriptionManager::new(ManagerConfig {
        project_id: args.project,
        emulator_project_id: args.emulator_project_id,
    })
    .await?;

    match args.command {
        Command::CreatePull {
            topic,
            subscription,
        } => {
            let subscription = manager
                .ensure_pull_subscription(&TopicName(topic), &SubscriptionName(subscription))
                .await?;
            println!("{}", subscription.fully_qualified_name());
        }
        Command::CreatePush {
            topic,
            subscription,
            token,
        } => {
            let subscription = manager
                .ensure_push_subscription(
                    &TopicName(topic),
                    &SubscriptionName(subscription),
                    &token,
                )
                .await?;
            println!("{}", subscription.fully_qualified_name());
        }
        Command::List { json } => {
            let names: Vec<String> = manager
                .list_subscriptions()
                .await?
                .iter()
                .map(|subscription| subscription.fully_qualified_name().to_owned())
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        Command::Delete { subscription } => {
            manager
                .delete_subscription(&SubscriptionName(subscription))
                .await?;
        }
        Command::Publish {
            topic,
            data,
            attributes,
        } => {
            let attributes: HashMap<String, String> = attributes.into_iter().collect();
            let message_id = manager
                .publish(
                    &TopicName(topic),
                    PubsubMessageToPublish::new(data, attributes),
                )
                .await?;
            println!("{message_id}");
        }
        Command::Receive {
            subscription,
            timeout_secs,
        } => {
            let cancel_token = CancellationToken::new();

            let ctrl_c_token = cancel_token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("interrupted, shutting down receive session");
                    ctrl_c_token.cancel();
                }
            });

            let acked = manager
                .receive(
                    &SubscriptionName(subscription),
                    Duration::from_secs(timeout_secs),
                    cancel_token,
                )
                .await?;
            println!("acknowledged {acked} messages");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_args() {
        Args::command().debug_assert();
    }

    #[test]
    fn receive_defaults_to_thirty_seconds() {
        let args = Args::try_parse_from(["subman", "receive", "--subscription", "my-sub"]).unwrap();

        match args.command {
            Command::Receive { timeout_secs, .. } => assert_eq!(timeout_secs, 30),
            command => panic!("unexpected command: {command:?}"),
        }
    }

    #[test]
    fn publish_attributes_parse_as_key_value_pairs() {
        let args = Args::try_parse_from([
            "subman", "publish", "--topic", "t", "--data", "d", "--attr", "k=v", "--attr", "x=y=z",
        ])
        .unwrap();

        match args.command {
            Command::Publish { attributes, .. } => {
                assert_eq!(
                    attributes,
                    vec![
                        ("k".to_string(), "v".to_string()),
                        ("x".to_string(), "y=z".to_string())
                    ]
                );
            }
            command => panic!("unexpected command: {command:?}"),
        }
    }

    #[test]
    fn global_project_flag_works_after_subcommand() {
        let args =
            Args::try_parse_from(["subman", "list", "--project", "my-project", "--json"]).unwrap();

        assert_eq!(args.project.as_deref(), Some("my-project"));
        assert!(matches!(args.command, Command::List { json: true }));
    }
}
