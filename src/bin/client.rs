use clap::{Args, Parser, Subcommand};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::env;

/// Staff client of the back office server
#[derive(Parser, Debug)]
#[command(name = "backoffice")]
#[command(about = "client cli used by restaurant staffs to place orders and settle invoices", version, long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// order related ops
    #[command(arg_required_else_help = true)]
    Order(OrderArgs),
    /// invoice related ops
    #[command(arg_required_else_help = true)]
    Invoice(InvoiceArgs),
}

#[derive(Debug, Args)]
struct OrderArgs {
    #[command(subcommand)]
    command: OrderCmds,
}

#[derive(Debug, Subcommand)]
enum OrderCmds {
    #[command(arg_required_else_help = true)]
    Create {
        #[arg(short = 't', long, help = "Table the order is placed at.")]
        table: Option<String>,
        #[arg(
            long,
            help = "Line items to order.",
            value_name = "FOOD_ID:QUANTITY:UNIT_PRICE",
            num_args = 1..,
            value_parser = parse_item
        )]
        items: Vec<LineItem>,
    },
    #[command(arg_required_else_help = true)]
    Summary { order_id: String },
}

#[derive(Debug, Args)]
struct InvoiceArgs {
    #[command(subcommand)]
    command: InvoiceCmds,
}

#[derive(Debug, Subcommand)]
enum InvoiceCmds {
    #[command(arg_required_else_help = true)]
    Create {
        order_id: String,
        #[arg(short = 'm', long, help = "CARD or CASH.")]
        method: Option<String>,
    },
    #[command(arg_required_else_help = true)]
    Show { invoice_id: String },
    /// mark an invoice as paid
    #[command(arg_required_else_help = true)]
    Pay {
        invoice_id: String,
        #[arg(short = 'm', long, help = "CARD or CASH.")]
        method: String,
    },
}

#[derive(Debug, Clone, Serialize)]
struct LineItem {
    food_id: String,
    quantity: i64,
    unit_price: f64,
}

fn parse_item(s: &str) -> Result<LineItem, String> {
    let mut parts = s.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(food_id), Some(quantity), Some(unit_price)) if !food_id.is_empty() => Ok(LineItem {
            food_id: food_id.to_string(),
            quantity: quantity.parse().map_err(|e| format!("bad quantity {}: {}", quantity, e))?,
            unit_price: unit_price.parse().map_err(|e| format!("bad unit price {}: {}", unit_price, e))?,
        }),
        _ => Err(format!("expected FOOD_ID:QUANTITY:UNIT_PRICE, got {}", s)),
    }
}

const DEFAULT_HOST: &str = "http://localhost:8080";

async fn report(res: Response, what: &str) -> Result<(), anyhow::Error> {
    match res.status() {
        StatusCode::OK => {
            let body = res.json::<Value>().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
            let body = res.json::<Value>().await?;
            println!("{} failed, {}", what, body["error"]);
        }
        unexpected => {
            println!("got unexpected status code, {}", unexpected);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Cli::parse();
    let host = env::var("BACKOFFICE_HOST").unwrap_or(DEFAULT_HOST.to_string());
    let client = Client::new();

    match args.command {
        Commands::Order(order) => match order.command {
            OrderCmds::Create { table, items } => {
                println!("placing order with {} items", items.len());
                let res = client
                    .post(format!("{}/orderItems", host))
                    .json(&serde_json::json!({
                        "table_id": table,
                        "order_items": items,
                    }))
                    .send()
                    .await?;
                report(res, "placing order").await?;
            }
            OrderCmds::Summary { order_id } => {
                let res = client
                    .get(format!("{}/orderItems-order/{}", host, order_id))
                    .send()
                    .await?;
                report(res, "summary").await?;
            }
        },
        Commands::Invoice(invoice) => match invoice.command {
            InvoiceCmds::Create { order_id, method } => {
                let res = client
                    .post(format!("{}/invoices", host))
                    .json(&serde_json::json!({
                        "order_id": order_id,
                        "payment_method": method,
                    }))
                    .send()
                    .await?;
                report(res, "creating invoice").await?;
            }
            InvoiceCmds::Show { invoice_id } => {
                let res = client.get(format!("{}/invoices/{}", host, invoice_id)).send().await?;
                report(res, "invoice").await?;
            }
            InvoiceCmds::Pay { invoice_id, method } => {
                println!("settling invoice={}", invoice_id);
                let res = client
                    .patch(format!("{}/invoices/{}", host, invoice_id))
                    .json(&serde_json::json!({
                        "payment_method": method,
                        "payment_status": "PAID",
                    }))
                    .send()
                    .await?;
                report(res, "payment").await?;
            }
        },
    };
    Ok(())
}
