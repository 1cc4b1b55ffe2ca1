//! Minimal consumer: one page whose "markup" is just its text content.
//!
//! Run with:
//!   cargo run --example consumer
//!
//! In another terminal, serve a directory and save `Main.page~` in it with
//! content like `<Page x:Class="Demo.MainPage">hello</Page>`:
//!   cargo run --features cli -- serve ./pages

use std::sync::{Arc, Mutex};

use liveswap::client::{
    enable, ClientConfig, ClientSession, DataContext, HotSwap, LiveNode, LiveTree, LoadError,
    MarkupLoader, UiThread,
};

struct TextPage {
    identity: &'static str,
    body: Mutex<String>,
    context: Mutex<Option<DataContext>>,
}

impl LiveNode for TextPage {
    fn identity(&self) -> &str {
        self.identity
    }

    fn data_context(&self) -> Option<DataContext> {
        self.context.lock().ok()?.clone()
    }

    fn set_data_context(&self, context: Option<DataContext>) {
        if let Ok(mut slot) = self.context.lock() {
            *slot = context;
        }
    }

    fn force_layout(&self) {
        if let Ok(body) = self.body.lock() {
            eprintln!("[{}] {}", self.identity, body);
        }
    }
}

/// Stores the document in the page; only knows about `TextPage`.
struct TextLoader {
    page: Arc<TextPage>,
}

impl MarkupLoader for TextLoader {
    fn load(&self, node: &dyn LiveNode, markup: &str) -> Result<(), LoadError> {
        if node.identity() != self.page.identity {
            return Err(format!("no loader for {}", node.identity()).into());
        }
        *self.page.body.lock().map_err(|e| e.to_string())? = markup.to_string();
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let view_model: DataContext = Arc::new("demo view model");
    let page = Arc::new(TextPage {
        identity: "Demo.MainPage",
        body: Mutex::new(String::new()),
        context: Mutex::new(Some(view_model)),
    });

    let ui = Arc::new(UiThread::spawn("demo-ui")?);
    let swap = HotSwap::new(Arc::new(TextLoader { page: page.clone() }), ui);
    let session = Arc::new(ClientSession::new(
        Arc::new(LiveTree::with_root(page)),
        swap,
    ));

    let config = ClientConfig::default();
    eprintln!("Connecting to {}", config.server_addr);
    let receiver = enable(&config, session, |err| eprintln!("Live reload stopped: {err}"))?;

    let _ = receiver.join();
    Ok(())
}
