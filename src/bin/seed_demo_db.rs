// ==========================================
// 播种墙扫码分拣系统 - 演示库重置与种子脚本
// ==========================================
// 用法: seed_demo_db [db_path] [cubby_count]
// 行为: 备份旧库 → 重建 schema → 灌入格口池/商品目录/演示订单
// 说明: 生产环境的开墙与接单都在外部系统，本脚本只服务联调
// ==========================================

use std::error::Error;
use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};

use putwall_scan::app::get_default_db_path;
use putwall_scan::db::{init_schema, open_sqlite_connection};

const DEFAULT_CUBBY_COUNT: i64 = 12;

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    let cubby_count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_CUBBY_COUNT)
        .max(1);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;

    // 重建 schema
    init_schema(&conn)?;

    // 灌入演示数据
    seed_demo_data(&conn, cubby_count)?;

    print_quick_counts(&conn)?;

    println!("演示库就绪: {}", db_path);
    Ok(())
}

/// 备份并删除旧库文件
fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if path.exists() {
        let backup_path = format!("{}.bak-{}", db_path, Utc::now().format("%Y%m%d%H%M%S"));
        fs::rename(path, &backup_path)?;
        println!("旧库已备份: {}", backup_path);
    }
    Ok(())
}

/// 灌入格口池、商品目录与演示订单
fn seed_demo_data(conn: &Connection, cubby_count: i64) -> Result<(), Box<dyn Error>> {
    let now = Utc::now();

    // 格口池（开墙）
    for cubby_id in 1..=cubby_count {
        conn.execute(
            "INSERT INTO cubby (cubby_id, occupied, in_progress, updated_at) VALUES (?1, 0, 0, ?2)",
            params![cubby_id, now],
        )?;
    }

    // 商品目录
    let products: &[(&str, &str)] = &[
        ("SKU-TEE-M", "圆领T恤 M码"),
        ("SKU-TEE-L", "圆领T恤 L码"),
        ("SKU-HOODIE-M", "连帽卫衣 M码"),
        ("SKU-CAP-01", "棒球帽"),
        ("SKU-SOCK-3P", "运动袜三双装"),
        ("SKU-MUG-01", "马克杯"),
    ];
    for (sku, name) in products {
        conn.execute(
            "INSERT INTO product (sku, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![sku, name, now],
        )?;
    }

    // 演示订单（剩余件数 = 明细数）
    let orders: &[(&str, &[&str])] = &[
        ("ORD-1001", &["SKU-TEE-M", "SKU-CAP-01"]),
        ("ORD-1002", &["SKU-MUG-01"]),
        ("ORD-1003", &["SKU-TEE-L", "SKU-HOODIE-M", "SKU-SOCK-3P"]),
    ];
    for (order_id, skus) in orders {
        conn.execute(
            "INSERT INTO orders (order_id, cubby_id, remaining_items, created_at, updated_at)
             VALUES (?1, NULL, ?2, ?3, ?3)",
            params![order_id, skus.len() as i64, now],
        )?;
        for sku in *skus {
            conn.execute(
                "INSERT INTO order_item (order_id, sku, scanned, scanned_at) VALUES (?1, ?2, 0, NULL)",
                params![order_id, sku],
            )?;
        }
    }

    Ok(())
}

/// 打印种子结果概览
fn print_quick_counts(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let cubbies: i64 = conn.query_row("SELECT COUNT(*) FROM cubby", [], |row| row.get(0))?;
    let products: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
    let orders: i64 = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
    let items: i64 = conn.query_row("SELECT COUNT(*) FROM order_item", [], |row| row.get(0))?;

    println!(
        "种子完成: cubby={}, product={}, orders={}, order_item={}",
        cubbies, products, orders, items
    );
    Ok(())
}
