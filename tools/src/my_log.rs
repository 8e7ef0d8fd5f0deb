use log::{info, LevelFilter};
use simplelog::ColorChoice;
use simplelog::{CombinedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::Path;
use std::time;

///初始化日志
/// 传入info_path作为 info文件路径
/// 传入error_path作为 error文件路径
pub fn init_log(info_path: &str, error_path: &str) {
    let log_time = time::SystemTime::now();
    //日志目录不存在就先建出来
    for path in [info_path, error_path] {
        if let Some(parent) = Path::new(path).parent() {
            let res = std::fs::create_dir_all(parent);
            if let Err(e) = res {
                panic!("create log dir for {} failed! {:?}", path, e);
            }
        }
    }
    let mut config = simplelog::ConfigBuilder::new();
    config.set_time_format_str("%Y-%m-%d %H:%M:%S");
    config.set_time_to_local(true);
    config.set_target_level(LevelFilter::Error);
    config.set_location_level(LevelFilter::Error);
    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            config.build(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            LevelFilter::Info,
            config.build(),
            File::create(info_path).unwrap(),
        ),
        WriteLogger::new(
            LevelFilter::Error,
            config.build(),
            File::create(error_path).unwrap(),
        ),
    ])
    .unwrap();
    info!(
        "日志模块初始化完成！耗时:{}ms",
        log_time.elapsed().unwrap().as_millis()
    );
}
