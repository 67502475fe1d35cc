//! Subcommand implementations.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod support;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create an account (does not log in)
    Register {
        #[arg(short, long)]
        email: String,

        /// Password, at least 6 characters (read from stdin when omitted)
        #[arg(short, long, env = "BOUTIQUE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        address: Option<String>,
    },
    /// Update the logged-in user's profile
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(Subcommand, Default)]
pub enum CartAction {
    /// Show the cart
    #[default]
    Show,
    /// Add units of a product
    Add {
        /// Product id
        id: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Add one unit
    Inc { id: String },
    /// Remove one unit (a line at quantity 1 stays)
    Dec { id: String },
    /// Delete a line
    Remove { id: String },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand, Default)]
pub enum OrderAction {
    /// List orders
    #[default]
    List,
    /// Show one order
    Show { id: String },
    /// Turn the account cart into an order
    Checkout,
    /// Pay an order by card
    Pay {
        id: String,

        /// Card number, spaces allowed
        #[arg(long, env = "BOUTIQUE_CARD_NUMBER", hide_env_values = true)]
        card: String,

        #[arg(long)]
        exp_month: u8,

        #[arg(long)]
        exp_year: u16,

        #[arg(long, env = "BOUTIQUE_CARD_CVC", hide_env_values = true)]
        cvc: String,

        #[arg(long)]
        postal_code: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long, requires = "street_name")]
        street_number: Option<String>,

        #[arg(long, requires = "street_number")]
        street_name: Option<String>,
    },
    /// Cancel an order (paid orders are refunded)
    Cancel { id: String },
    /// Show shipping status
    Track { id: String },
    /// Show the invoice
    Invoice { id: String },
}

#[derive(Subcommand, Default)]
pub enum SupportAction {
    /// List threads
    #[default]
    List,
    /// Show a thread and its messages, marking them read
    Show { id: String },
    /// Open a thread
    Open {
        #[arg(short, long)]
        subject: String,

        /// Order the thread is about
        #[arg(long)]
        order: Option<String>,

        /// First message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Post a message to a thread
    Reply { id: String, message: String },
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// List every product, inactive ones included
    Products,
    /// Create a product
    AddProduct {
        #[arg(long)]
        name: String,

        /// Price in cents
        #[arg(long)]
        price: i64,

        #[arg(long, default_value_t = 0)]
        stock: i64,

        #[arg(long)]
        description: Option<String>,
    },
    /// Change some fields of a product
    EditProduct {
        id: String,

        #[arg(long)]
        name: Option<String>,

        /// Price in cents
        #[arg(long)]
        price: Option<i64>,

        #[arg(long)]
        stock: Option<i64>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a product for good
    DeleteProduct { id: String },
    /// List orders of every customer
    Orders {
        /// Only this customer's orders
        #[arg(long)]
        user: Option<String>,
    },
    /// Show an order with its lifecycle and payments
    Order { id: String },
    /// Validate a created or paid order
    Validate { id: String },
    /// Ship a validated or paid order
    Ship {
        id: String,

        #[arg(long, default_value = "Colissimo")]
        carrier: String,

        #[arg(long)]
        tracking: Option<String>,
    },
    /// Record delivery of a shipped order
    Delivered { id: String },
    /// Refund an order and restock its items
    Refund {
        id: String,

        /// Partial amount in cents (whole order when omitted)
        #[arg(long)]
        amount: Option<i64>,
    },
    /// List support threads of every customer
    Threads,
    /// Show a support thread
    Thread { id: String },
    /// Answer a support thread as the support team
    Answer { id: String, message: String },
    /// Close a support thread
    Close { id: String },
}
