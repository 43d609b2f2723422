// ==========================================
// 并发控制测试
// ==========================================
// 职责: 验证格口占用/互斥/计数递减在并发下的正确性
// 所有共享状态变更都必须经得起多线程同时发起
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod concurrent_control_test {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use putwall_scan::api::{ApiError, ScanItemRequest};
    use putwall_scan::engine::allocator::CubbyAllocator;
    use putwall_scan::engine::progress::OrderProgressTracker;
    use putwall_scan::repository::RepositoryError;

    use crate::test_helpers::{seed_cubbies, seed_order, seed_product, setup_scan_env};

    // ==========================================
    // 测试1: 并发占用不双占
    // ==========================================

    /// K=8 路并发抢 N=4 个格口：恰好 4 次成功、无重复格口，
    /// 其余拿到“无可用格口”
    #[test]
    fn test_concurrent_claims_no_double_assignment() {
        let env = setup_scan_env();
        seed_cubbies(&env, 4);

        // 重试上限放宽到 16：单线程最多连输 4 轮（每输一轮
        // 候选都已换人），上限只需覆盖这个数
        let allocator = Arc::new(CubbyAllocator::new(env.cubby_repo.clone(), 16));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let allocator = allocator.clone();
            handles.push(thread::spawn(move || allocator.claim().unwrap()));
        }

        let results: Vec<Option<i64>> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let claimed: Vec<i64> = results.iter().filter_map(|r| *r).collect();
        let exhausted = results.iter().filter(|r| r.is_none()).count();

        assert_eq!(claimed.len(), 4, "恰好 4 次成功占用");
        assert_eq!(exhausted, 4, "其余 4 路拿到无可用格口");

        let distinct: HashSet<i64> = claimed.iter().copied().collect();
        assert_eq!(distinct.len(), 4, "无格口被占用两次");
        assert_eq!(env.cubby_repo.count_free().unwrap(), 0);
    }

    // ==========================================
    // 测试2: 并发递减不丢减不为负
    // ==========================================

    /// 剩余 R=6 的订单被 6 路并发扫不同条码：
    /// 计数恰好归零，且每次返回的剩余值互不相同
    #[test]
    fn test_concurrent_scans_drain_to_exactly_zero() {
        let env = setup_scan_env();
        let skus: Vec<String> = (0..6).map(|i| format!("SKU-{}", i)).collect();
        let sku_refs: Vec<&str> = skus.iter().map(|s| s.as_str()).collect();
        seed_order(&env, "ORD1", &sku_refs);

        let progress = Arc::new(OrderProgressTracker::new(env.order_repo.clone()));

        let mut handles = Vec::new();
        for sku in skus {
            let progress = progress.clone();
            handles.push(thread::spawn(move || {
                progress.record_scan("ORD1", &sku).unwrap()
            }));
        }

        let mut remaining_values: Vec<i64> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();
        remaining_values.sort();

        // 每次成功扫码恰好 -1：返回值必然是 0..=5 各一次
        assert_eq!(remaining_values, vec![0, 1, 2, 3, 4, 5]);

        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        assert_eq!(order.remaining_items, 0);
        assert_eq!(env.order_repo.count_unscanned("ORD1").unwrap(), 0);
    }

    // ==========================================
    // 测试3: 投料中互斥闸门
    // ==========================================

    /// 同一格口并发置投料中：只有一路成功，其余拿到冲突；
    /// 放置确认后闸门重新打开
    #[test]
    fn test_concurrent_mark_in_progress_single_winner() {
        let env = setup_scan_env();
        seed_cubbies(&env, 1);
        assert!(env.cubby_repo.try_claim(1).unwrap());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cubby_repo = env.cubby_repo.clone();
            handles.push(thread::spawn(move || cubby_repo.mark_in_progress(1)));
        }

        let results: Vec<Result<(), RepositoryError>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        let conflict_count = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(RepositoryError::ConditionalUpdateConflict { .. })
                )
            })
            .count();

        assert_eq!(ok_count, 1, "互斥闸门只放行一路");
        assert_eq!(conflict_count, 3);

        // 确认后可再次置位
        env.cubby_repo.confirm_placement(1).unwrap();
        env.cubby_repo.mark_in_progress(1).unwrap();
    }

    // ==========================================
    // 测试4: 并发重复扫码只记一次
    // ==========================================

    /// 同一 (订单, 条码) 4 路并发记账：一路成功，其余重复扫码冲突，
    /// 计数只减一次
    #[test]
    fn test_concurrent_duplicate_scan_single_decrement() {
        let env = setup_scan_env();
        seed_order(&env, "ORD1", &["SKU-A", "SKU-B"]);

        let progress = Arc::new(OrderProgressTracker::new(env.order_repo.clone()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let progress = progress.clone();
            handles.push(thread::spawn(move || progress.record_scan("ORD1", "SKU-A")));
        }

        let results: Vec<Result<i64, RepositoryError>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        let conflict_count = results
            .iter()
            .filter(|r| {
                matches!(
                    r,
                    Err(RepositoryError::ConditionalUpdateConflict { .. })
                )
            })
            .count();

        assert_eq!(ok_count, 1);
        assert_eq!(conflict_count, 3);

        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        assert_eq!(order.remaining_items, 1, "计数只被递减一次");
    }

    // ==========================================
    // 测试5: 并发首扫只挂接一个格口
    // ==========================================

    /// 同一订单的两件被并发首扫：订单只挂接一个格口，
    /// 落败方抢到的格口被回收，不滞留占用
    #[test]
    fn test_concurrent_first_scans_single_cubby_binding() {
        let env = setup_scan_env();
        seed_cubbies(&env, 4);
        seed_product(&env, "SKU-A", "商品A");
        seed_product(&env, "SKU-B", "商品B");
        seed_order(&env, "ORD1", &["SKU-A", "SKU-B"]);

        let mut handles = Vec::new();
        for sku in ["SKU-A", "SKU-B"] {
            let scan_api = env.scan_api.clone();
            handles.push(thread::spawn(move || {
                scan_api.scan_item(&ScanItemRequest {
                    scan_code: sku.to_string(),
                    order_id: Some("ORD1".to_string()),
                })
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // 一路成功投料；另一路要么撞上互斥闸门（CubbyBusy），
        // 两路不可能同时成功（中间无放置确认）
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        let busy_count = results
            .iter()
            .filter(|r| matches!(r, Err(ApiError::CubbyBusy { .. })))
            .count();
        assert_eq!(ok_count, 1);
        assert_eq!(busy_count, 1);

        // 订单恰好挂接一个格口，且全局只占用这一个
        let order = env.order_repo.find_by_id("ORD1").unwrap().unwrap();
        let bound = order.cubby_id.expect("订单应已挂接格口");
        assert_eq!(env.cubby_repo.count_free().unwrap(), 3, "落败格口已回收");

        let cubby = env.cubby_repo.find_by_id(bound).unwrap().unwrap();
        assert!(cubby.occupied);
        assert!(cubby.in_progress, "成功那件放置待确认");
    }
}
