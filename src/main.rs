use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use groupbuy_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{HttpAccountLedger, HttpOrderFactory},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 外部协作方：用户余额账本与订单服务
    let ledger = Arc::new(HttpAccountLedger::new(config.ledger.clone()));
    let order_factory = Arc::new(HttpOrderFactory::new(config.orders.clone()));

    // 创建服务
    let activity_service = ActivityService::new(pool.clone());
    let commission_service = CommissionService::new(pool.clone());
    let team_service = TeamService::new(
        pool.clone(),
        ledger,
        order_factory,
        commission_service.clone(),
        config.groupbuy.clone(),
    );

    // 启动后台任务（过期团扫描 + 活动窗口滚动）
    tasks::spawn_all(
        team_service.clone(),
        activity_service.clone(),
        config.groupbuy.sweep_interval_secs,
    );

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(activity_service.clone()))
            .app_data(web::Data::new(commission_service.clone()))
            .app_data(web::Data::new(team_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::activity_config)
                    .configure(handlers::team_config)
                    .configure(handlers::commission_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
