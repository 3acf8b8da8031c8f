// Работа со временем

/// Текущее время в миллисекундах Unix-эпохи
///
/// Миллисекунды, а не секунды: порядок сообщений в истории
/// сортируется по этому полю.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
