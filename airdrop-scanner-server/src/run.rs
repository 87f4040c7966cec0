use std::{net::TcpListener, sync::Arc};

use actix_web::{dev::Server, web, App, HttpServer};
use airdrop_scanner_logic::{
    cache::ScanCache, catalog::default_catalog, chains::ChainRegistry, jobs::BulkScanConfig,
    BulkScanService, MultiChainScanner, WalletChecker,
};

use crate::{handlers, settings::RealtimeSettings, Settings};

/// Everything the handlers need, shared across workers.
pub struct AppState {
    pub checker: Arc<WalletChecker>,
    pub bulk: BulkScanService,
    pub chains: ChainRegistry,
    pub realtime: RealtimeSettings,
}

pub fn run(settings: Settings) -> Result<Server, anyhow::Error> {
    let cache = Arc::new(ScanCache::new(settings.scanner.cache_ttl()));
    // detached; the sweeper lives as long as the process
    let _ = cache.spawn_sweeper(settings.scanner.cache_sweep_interval());

    let chains = ChainRegistry::default();
    let scanner = Arc::new(MultiChainScanner::new(
        chains.clone(),
        cache,
        settings.scanner.cache_ttl(),
        settings.scanner.request_timeout(),
    ));
    let checker = Arc::new(WalletChecker::new(
        scanner,
        Arc::new(default_catalog()),
        settings.scanner.per_wallet_concurrency,
    ));
    let bulk = BulkScanService::new(
        Arc::clone(&checker),
        BulkScanConfig {
            max_wallets: settings.bulk.max_wallets,
            concurrency: settings.bulk.concurrency,
            retention: settings.bulk.retention(),
        },
    );

    let state = web::Data::new(AppState {
        checker,
        bulk,
        chains,
        realtime: settings.realtime,
    });

    tracing::info!(addr = %settings.server.addr, "starting http server");
    let listener = TcpListener::bind(settings.server.addr)?;
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .listen(listener)?
    .run();
    Ok(server)
}
