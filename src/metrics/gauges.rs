//! Built-in gauge name sets
//!
//! Stats not listed for their context are exported as counters. Operators
//! can extend these sets from the config file.

/// Namespace stats that can go down
pub const NAMESPACE_GAUGES: &[&str] = &[
    "objects",
    "tombstones",
    "master_objects",
    "master_tombstones",
    "prole_objects",
    "prole_tombstones",
    "non_replica_objects",
    "non_replica_tombstones",
    "unreplicated_records",
    "dead_partitions",
    "unavailable_partitions",
    "clock_skew_stop_writes",
    "stop_writes",
    "hwm_breached",
    "current_time",
    "non_expirable_objects",
    "expired_objects",
    "evicted_objects",
    "evict_ttl",
    "evict_void_time",
    "smd_evict_void_time",
    "nsup_cycle_duration",
    "nsup_cycle_sleep_pct",
    "truncate_lut",
    "sindex-gc-cleaned",
    "memory_used_bytes",
    "memory_used_data_bytes",
    "memory_used_index_bytes",
    "memory_used_set_index_bytes",
    "memory_used_sindex_bytes",
    "memory_free_pct",
    "index_flash_used_bytes",
    "index_flash_used_pct",
    "index_pmem_used_bytes",
    "index_pmem_used_pct",
    "sindex_flash_used_bytes",
    "sindex_flash_used_pct",
    "device_total_bytes",
    "device_used_bytes",
    "device_free_pct",
    "device_available_pct",
    "device_compression_ratio",
    "pmem_total_bytes",
    "pmem_used_bytes",
    "pmem_free_pct",
    "pmem_available_pct",
    "pmem_compression_ratio",
    "cache_read_pct",
    "record_proto_uncompressed_pct",
    "record_proto_compression_ratio",
    "query_proto_uncompressed_pct",
    "query_proto_compression_ratio",
    "appeals_tx_remaining",
    "appeals_rx_active",
    "migrate_tx_partitions_remaining",
    "migrate_rx_partitions_remaining",
    "migrate_tx_partitions_active",
    "migrate_rx_partitions_active",
    "migrate_signals_remaining",
    "migrate_tx_instances",
    "migrate_rx_instances",
    "migrate_records_skipped",
    "xdr_tombstones",
    "xdr_bin_cemeteries",
    "effective_replication_factor",
    "effective_is_quiesced",
    "nodes_quiesced",
    "pending_quiesce",
    "high-water-disk-pct",
    "high-water-memory-pct",
    "stop-writes-pct",
    "replication-factor",
    "memory-size",
    "default-ttl",
    "max-record-size",
    "storage-engine_file_used_bytes",
    "storage-engine_file_free_wblocks",
    "storage-engine_file_write_q",
    "storage-engine_file_defrag_q",
    "storage-engine_file_age",
    "storage-engine_device_used_bytes",
    "storage-engine_device_free_wblocks",
    "storage-engine_device_write_q",
    "storage-engine_device_defrag_q",
    "storage-engine_device_age",
    "storage-engine_device_shadow_write_q",
];

/// Node statistics that can go down
pub const NODE_GAUGES: &[&str] = &[
    "cluster_size",
    "cluster_min_compatibility_id",
    "cluster_max_compatibility_id",
    "cluster_integrity",
    "cluster_is_member",
    "cluster_clock_skew_ms",
    "cluster_clock_skew_stop_writes_sec",
    "cluster_principal",
    "uptime",
    "objects",
    "tombstones",
    "tree_gc_queue",
    "system_total_cpu_pct",
    "system_user_cpu_pct",
    "system_kernel_cpu_pct",
    "system_free_mem_kbytes",
    "system_free_mem_pct",
    "system_thp_mem_kbytes",
    "process_cpu_pct",
    "threads_joinable",
    "threads_detached",
    "threads_pool_total",
    "threads_pool_active",
    "heap_allocated_kbytes",
    "heap_active_kbytes",
    "heap_mapped_kbytes",
    "heap_site_count",
    "heap_efficiency_pct",
    "info_queue",
    "rw_in_progress",
    "proxy_in_progress",
    "client_connections",
    "client_connections_opened",
    "heartbeat_connections",
    "fabric_connections",
    "fabric_bulk_send_rate",
    "fabric_bulk_recv_rate",
    "fabric_ctrl_send_rate",
    "fabric_ctrl_recv_rate",
    "fabric_meta_send_rate",
    "fabric_meta_recv_rate",
    "fabric_rw_send_rate",
    "fabric_rw_recv_rate",
    "migrate_allowed",
    "migrate_partitions_remaining",
    "batch_index_queue",
    "batch_index_unused_buffers",
    "batch_index_huge_buffers",
    "time_since_rebalance",
    "sindex_ucgarbage_found",
    "sindex_gc_list_deletions",
    "dlog_used_objects",
    "xdr_active_failed_node_sessions",
    "xdr_active_link_down_sessions",
];

/// Secondary index stats that can go down
pub const SINDEX_GAUGES: &[&str] = &[
    "keys",
    "entries",
    "ibtr_memory_used",
    "nbtr_memory_used",
    "memory_used",
    "si_accounted_memory",
    "load_pct",
    "loadtime",
    "load_time",
    "histogram",
    "entries_per_bval",
    "entries_per_rec",
    "used_bytes",
    "stat_gc_recs",
];
