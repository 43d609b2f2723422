// ==========================================
// 扫码 API 行为测试
// ==========================================
// 职责: 错误口径全集、最优订单选取规则、
// 重复扫码补偿、完单释放策略
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod scan_api_test {
    use putwall_scan::api::{ApiError, ScanItemRequest};
    use putwall_scan::config::config_keys;

    use crate::test_helpers::{seed_cubbies, seed_order, seed_product, setup_scan_env};

    fn scan(sku: &str, order_id: Option<&str>) -> ScanItemRequest {
        ScanItemRequest {
            scan_code: sku.to_string(),
            order_id: order_id.map(|s| s.to_string()),
        }
    }

    // ==========================================
    // 错误口径
    // ==========================================

    #[test]
    fn test_unknown_sku_rejected() {
        let env = setup_scan_env();
        seed_cubbies(&env, 1);

        let err = env
            .scan_api
            .scan_item(&scan("SKU-GHOST", None))
            .unwrap_err();
        assert!(matches!(err, ApiError::ProductNotFound(_)));

        // 失败同样留痕
        assert_eq!(env.scan_log_repo.count().unwrap(), 1);
    }

    #[test]
    fn test_unknown_order_rejected() {
        let env = setup_scan_env();
        seed_cubbies(&env, 1);
        seed_product(&env, "SKU1", "商品1");

        let err = env
            .scan_api
            .scan_item(&scan("SKU1", Some("ORD-GHOST")))
            .unwrap_err();
        assert!(matches!(err, ApiError::OrderNotFound(_)));
    }

    #[test]
    fn test_no_pending_order_for_sku() {
        let env = setup_scan_env();
        seed_cubbies(&env, 1);
        seed_product(&env, "SKU1", "商品1");
        // 唯一匹配订单的明细已扫光
        seed_order(&env, "ORD1", &["SKU1"]);
        env.order_repo.mark_item_scanned("ORD1", "SKU1").unwrap();
        env.order_repo.decrement_remaining("ORD1").unwrap();

        let err = env.scan_api.scan_item(&scan("SKU1", None)).unwrap_err();
        assert!(matches!(err, ApiError::NoPendingOrder(_)));
    }

    #[test]
    fn test_no_cubby_available() {
        let env = setup_scan_env();
        // 不开格口
        seed_product(&env, "SKU1", "商品1");
        seed_order(&env, "ORD1", &["SKU1"]);

        let err = env
            .scan_api
            .scan_item(&scan("SKU1", Some("ORD1")))
            .unwrap_err();
        assert!(matches!(err, ApiError::NoCubbyAvailable));

        // 订单保持未挂接，可在格口腾出后重试
        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        assert_eq!(order.cubby_id, None);
        assert_eq!(order.remaining_items, 1);
    }

    #[test]
    fn test_confirm_unknown_cubby() {
        let env = setup_scan_env();
        let err = env.scan_api.confirm_placement(99).unwrap_err();
        assert!(matches!(err, ApiError::CubbyNotFound(99)));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let env = setup_scan_env();

        let err = env.scan_api.scan_item(&scan("  ", None)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err = env.scan_api.scan_item(&scan("SKU1", Some(""))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    // ==========================================
    // 重复扫码与补偿
    // ==========================================

    /// 重复扫码被拒，计数不变，且投料中标志被回滚，
    /// 格口不会被一次误扫卡死
    #[test]
    fn test_duplicate_scan_rejected_and_gate_rolled_back() {
        let env = setup_scan_env();
        seed_cubbies(&env, 1);
        seed_product(&env, "SKU1", "商品1");
        seed_product(&env, "SKU2", "商品2");
        seed_order(&env, "ORD1", &["SKU1", "SKU2"]);

        env.scan_api.scan_item(&scan("SKU1", Some("ORD1"))).unwrap();
        env.scan_api.confirm_placement(1).unwrap();

        // 二次扫同一条码
        let err = env
            .scan_api
            .scan_item(&scan("SKU1", Some("ORD1")))
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateScan { .. }));

        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        assert_eq!(order.remaining_items, 1, "重复扫码不二次递减");

        // 标志已回滚：下一件无需人工干预即可投料
        let cubby = env.cubby_repo.find_by_id(1).unwrap().unwrap();
        assert!(!cubby.in_progress);
        env.scan_api.scan_item(&scan("SKU2", Some("ORD1"))).unwrap();
    }

    /// 订单中无此明细：拒绝 + 回滚，同样不卡格口
    #[test]
    fn test_item_not_in_order_rejected() {
        let env = setup_scan_env();
        seed_cubbies(&env, 1);
        seed_product(&env, "SKU1", "商品1");
        seed_product(&env, "SKU9", "商品9");
        seed_order(&env, "ORD1", &["SKU1"]);

        env.scan_api.scan_item(&scan("SKU1", Some("ORD1"))).unwrap();
        env.scan_api.confirm_placement(1).unwrap();

        let err = env
            .scan_api
            .scan_item(&scan("SKU9", Some("ORD1")))
            .unwrap_err();
        assert!(matches!(err, ApiError::ItemNotFound { .. }));

        let cubby = env.cubby_repo.find_by_id(1).unwrap().unwrap();
        assert!(!cubby.in_progress, "拒绝后投料中标志已回滚");
    }

    // ==========================================
    // 最优待分拣订单选取
    // ==========================================

    /// 剩余件数最少者优先
    #[test]
    fn test_best_pending_prefers_fewest_remaining() {
        let env = setup_scan_env();
        seed_cubbies(&env, 2);
        seed_product(&env, "SKU1", "商品1");
        seed_order(&env, "ORD-BIG", &["SKU1", "SKU2", "SKU3"]);
        seed_order(&env, "ORD-SMALL", &["SKU1", "SKU2"]);

        env.scan_api.scan_item(&scan("SKU1", None)).unwrap();

        let small = env.order_repo.find_by_id("ORD-SMALL").unwrap().unwrap();
        assert_eq!(small.remaining_items, 1, "快完的订单先吃进");
        let big = env.order_repo.find_by_id("ORD-BIG").unwrap().unwrap();
        assert_eq!(big.remaining_items, 3);
    }

    /// 剩余相同取订单号最小（确定性并列裁决）
    #[test]
    fn test_best_pending_tie_breaks_on_order_id() {
        let env = setup_scan_env();
        seed_cubbies(&env, 2);
        seed_product(&env, "SKU1", "商品1");
        seed_order(&env, "ORD-B", &["SKU1"]);
        seed_order(&env, "ORD-A", &["SKU1"]);

        env.scan_api.scan_item(&scan("SKU1", None)).unwrap();

        let a = env.order_repo.find_by_id("ORD-A").unwrap().unwrap();
        assert_eq!(a.remaining_items, 0);
        let b = env.order_repo.find_by_id("ORD-B").unwrap().unwrap();
        assert_eq!(b.remaining_items, 1);
    }

    // ==========================================
    // 完单释放策略（配置开关）
    // ==========================================

    /// 开启完单释放后，最后一件的放置确认顺带释放格口，
    /// 下一个订单可复用
    #[test]
    fn test_release_on_complete_when_enabled() {
        let env = setup_scan_env();
        env.config
            .set_config(config_keys::RELEASE_ON_COMPLETE, "true")
            .unwrap();
        seed_cubbies(&env, 1);
        seed_product(&env, "SKU1", "商品1");
        seed_product(&env, "SKU2", "商品2");
        seed_order(&env, "ORD1", &["SKU1"]);
        seed_order(&env, "ORD2", &["SKU2"]);

        env.scan_api.scan_item(&scan("SKU1", Some("ORD1"))).unwrap();
        env.scan_api.confirm_placement(1).unwrap();

        // 格口已释放，订单挂接已摘
        let cubby = env.cubby_repo.find_by_id(1).unwrap().unwrap();
        assert!(!cubby.occupied);
        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        assert_eq!(order.cubby_id, None);

        // 唯一格口立即可服务下一个订单
        let resp = env.scan_api.scan_item(&scan("SKU2", Some("ORD2"))).unwrap();
        assert_eq!(resp.assigned_cubby, 1);
    }

    /// 未完单的放置确认不受释放策略影响
    #[test]
    fn test_release_policy_skips_incomplete_orders() {
        let env = setup_scan_env();
        env.config
            .set_config(config_keys::RELEASE_ON_COMPLETE, "true")
            .unwrap();
        seed_cubbies(&env, 1);
        seed_product(&env, "SKU1", "商品1");
        seed_order(&env, "ORD1", &["SKU1", "SKU2"]);

        env.scan_api.scan_item(&scan("SKU1", Some("ORD1"))).unwrap();
        env.scan_api.confirm_placement(1).unwrap();

        let cubby = env.cubby_repo.find_by_id(1).unwrap().unwrap();
        assert!(cubby.occupied, "订单未完，格口保持占用");
        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        assert_eq!(order.cubby_id, Some(1));
    }

    // ==========================================
    // 格口复用与顺位
    // ==========================================

    /// 占用按最小号顺位；释放后低号优先复用
    #[test]
    fn test_lowest_numbered_cubby_first() {
        let env = setup_scan_env();
        seed_cubbies(&env, 3);
        seed_product(&env, "SKU1", "商品1");
        seed_product(&env, "SKU2", "商品2");
        seed_product(&env, "SKU3", "商品3");
        seed_order(&env, "ORD1", &["SKU1"]);
        seed_order(&env, "ORD2", &["SKU2"]);
        seed_order(&env, "ORD3", &["SKU3"]);

        let r1 = env.scan_api.scan_item(&scan("SKU1", Some("ORD1"))).unwrap();
        let r2 = env.scan_api.scan_item(&scan("SKU2", Some("ORD2"))).unwrap();
        assert_eq!(r1.assigned_cubby, 1);
        assert_eq!(r2.assigned_cubby, 2);

        // 手工释放 1 号（外部完单工作流的动作）
        env.order_repo.clear_cubby("ORD1", 1).unwrap();
        env.cubby_repo.release(1).unwrap();

        let r3 = env.scan_api.scan_item(&scan("SKU3", Some("ORD3"))).unwrap();
        assert_eq!(r3.assigned_cubby, 1, "低号空闲格口优先");
    }
}
