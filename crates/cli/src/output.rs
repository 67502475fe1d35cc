//! Human-readable rendering of command results on stdout.

#![allow(clippy::print_stdout)]

use std::collections::HashMap;

use boutique_core::{Cart, CurrencyCode, Price, ProductId, UserProfile};
use boutique_storefront::api::{
    Ack, CancelReceipt, CheckoutReceipt, Delivery, Invoice, Order, OrderDiagnostics,
    PaymentReceipt, Product, SupportMessage, SupportThread,
};
use boutique_storefront::cart::ReconcileResult;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn line(text: &str) {
    println!("{text}");
}

pub fn welcome(profile: &UserProfile) {
    println!("Logged in as {} <{}>.", profile.display_name(), profile.email);
}

pub fn reconcile(result: &ReconcileResult) {
    if result.attempted() == 0 {
        return;
    }
    println!("Moved {} cart line(s) to your account.", result.synced);
    if result.is_partial_failure() {
        let failed: Vec<_> = result.failed.iter().map(ProductId::as_str).collect();
        println!(
            "Could not move {} line(s), they were dropped: {}",
            failed.len(),
            failed.join(", ")
        );
    }
}

pub fn profile(profile: &UserProfile) {
    println!("{} <{}>", profile.display_name(), profile.email);
    println!("  id:      {}", profile.id);
    if let Some(address) = &profile.address {
        println!("  address: {address}");
    }
    if profile.is_admin {
        println!("  role:    administrator");
    }
}

pub fn cart(cart: &Cart, products: &[Product], is_local: bool) {
    let origin = if is_local { "local cart" } else { "account cart" };
    if cart.is_empty() {
        println!("Your {origin} is empty.");
        return;
    }

    let by_id: HashMap<&ProductId, &Product> =
        products.iter().map(|product| (&product.id, product)).collect();
    let mut total = Price::from_cents(0, CurrencyCode::EUR);
    let mut priced = true;

    println!("Your {origin}:");
    for line in cart {
        match by_id.get(&line.product_id) {
            Some(product) => {
                let subtotal = product.price().times(line.quantity);
                total.amount += subtotal.amount;
                println!(
                    "  {:>3} x {:<30} {:>10}  ({})",
                    line.quantity,
                    product.name,
                    subtotal.to_string(),
                    line.product_id
                );
            }
            None => {
                priced = false;
                println!("  {:>3} x {}", line.quantity, line.product_id);
            }
        }
    }
    if priced {
        println!("  Total: {total}");
    }
}

pub fn products(products: &[&Product]) {
    if products.is_empty() {
        println!("No products.");
        return;
    }
    for product in products {
        let stock = if product.can_supply(1) {
            format!("{} in stock", product.stock_qty)
        } else {
            "out of stock".to_string()
        };
        println!(
            "{:<12} {:<30} {:>10}  {stock}",
            product.id.as_str(),
            product.name,
            product.price().to_string()
        );
    }
}

pub fn product(product: &Product) {
    println!("{} ({})", product.name, product.id);
    println!("  price: {}", product.price());
    println!("  stock: {}", product.stock_qty);
    if let Some(description) = &product.description {
        println!();
        println!("{description}");
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        let date = order
            .created_at
            .map(|at| at.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        println!(
            "{:<38} {:<16} {:>10}  {} line(s)  {date}",
            order.id.as_str(),
            order.status.to_string(),
            order.total().to_string(),
            order.line_count()
        );
    }
}

pub fn order(order: &Order) {
    println!("Order {} ({})", order.id, order.status);
    if let Some(at) = order.created_at {
        println!("  placed: {}", at.format(DATE_FORMAT));
    }
    for item in &order.items {
        println!(
            "  {:>3} x {:<30} {:>10}",
            item.quantity,
            item.name,
            item.line_total().to_string()
        );
    }
    println!("  Total: {}", order.total());
    if let Some(delivery) = &order.delivery {
        self::delivery(delivery);
    }
    if order.status.awaits_payment() {
        println!("Awaiting payment: boutique orders pay {} ...", order.id);
    }
}

pub fn checkout(receipt: &CheckoutReceipt) {
    println!("Order {} created ({}).", receipt.order_id, receipt.status);
    if let Some(cents) = receipt.total_cents {
        println!("  Total: {}", Price::from_cents(cents, CurrencyCode::EUR));
    }
}

pub fn payment(receipt: &PaymentReceipt, last4: &str) {
    print!("Paid with card ending {last4}");
    if let Some(cents) = receipt.amount_cents {
        print!(": {}", Price::from_cents(cents, CurrencyCode::EUR));
    }
    println!(" (payment {}).", receipt.payment_id);
}

pub fn cancellation(receipt: &CancelReceipt) {
    println!(
        "{}",
        receipt.message.as_deref().unwrap_or("Order cancelled.")
    );
    if let Some(refund) = receipt.refund() {
        println!("Refunded {refund}.");
    }
}

pub fn delivery(delivery: &Delivery) {
    print!("  Shipping: {} with {}", delivery.delivery_status, delivery.carrier);
    match &delivery.tracking_number {
        Some(tracking) => println!(", tracking {tracking}"),
        None => println!(),
    }
}

pub fn invoice(invoice: &Invoice) {
    println!("Invoice {} for order {}", invoice.number, invoice.order_id);
    if let Some(at) = invoice.issued_at {
        println!("  issued: {}", at.format(DATE_FORMAT));
    }
    for line in &invoice.lines {
        println!(
            "  {:>3} x {:<30} {:>10}",
            line.quantity,
            line.name,
            Price::from_cents(line.line_total_cents, CurrencyCode::EUR).to_string()
        );
    }
    println!("  Total: {}", invoice.total());
}

pub fn threads(threads: &[SupportThread]) {
    if threads.is_empty() {
        println!("No support threads.");
        return;
    }
    for thread in threads {
        let state = if thread.closed { "closed" } else { "open" };
        let unread = if thread.unread_count > 0 {
            format!("  {} unread", thread.unread_count)
        } else {
            String::new()
        };
        println!(
            "{:<38} {state:<6} {}{unread}",
            thread.id.as_str(),
            thread.subject
        );
    }
}

pub fn thread(thread: &SupportThread) {
    println!("{} ({})", thread.subject, thread.id);
    if let Some(order_id) = &thread.order_id {
        println!("  about order {order_id}");
    }
    for message in &thread.messages {
        self::message(message);
    }
}

pub fn message(message: &SupportMessage) {
    let author = message.author_name.as_deref().unwrap_or("you");
    let at = message
        .created_at
        .map(|at| at.format(DATE_FORMAT).to_string())
        .unwrap_or_default();
    println!("[{at}] {author}: {}", message.content);
}

pub fn ack(ack: &Ack, fallback: &str) {
    println!("{}", ack.message.as_deref().unwrap_or(fallback));
}

pub fn diagnostics(diagnostics: &OrderDiagnostics) {
    if let Some(user_id) = &diagnostics.user_id {
        println!("  customer: {user_id}");
    }
    for (label, at) in [
        ("validated", diagnostics.validated_at),
        ("shipped", diagnostics.shipped_at),
        ("delivered", diagnostics.delivered_at),
        ("cancelled", diagnostics.cancelled_at),
        ("refunded", diagnostics.refunded_at),
    ] {
        if let Some(at) = at {
            println!("  {label}: {}", at.format(DATE_FORMAT));
        }
    }
    for payment in &diagnostics.payments {
        println!(
            "  payment {} {} {}",
            payment.id,
            Price::from_cents(payment.amount_cents, CurrencyCode::EUR),
            payment.status
        );
    }
}
