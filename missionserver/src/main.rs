pub mod command;
pub mod link;
pub mod mgr;
pub mod mission;
pub mod status;

use crate::link::{DryRunLink, LogSink};
use crate::mgr::command_mgr::CommandProcessor;
use crate::status::ERR_NONE;
use log::{error, info};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tools::conf::Conf;

#[macro_use]
extern crate lazy_static;

lazy_static! {
    ///配置文件
    static ref CONF_MAP : Conf = {
        let path = env::current_dir().unwrap();
        let str = path.as_os_str().to_str().unwrap();
        let res = str.to_string()+"/config/config.conf";
        let conf = Conf::init(res.as_str());
        conf
    };
}

fn main() {
    let info_log = CONF_MAP.get_str("info_log_path");
    let error_log = CONF_MAP.get_str("error_log_path");
    //初始化日志
    tools::my_log::init_log(info_log, error_log);
    //初始化指令处理器并干跑一次自检
    init_processor();
}

///初始化指令处理器
///没有接上真实链路之前先用干跑链路自检一遍
fn init_processor() {
    let (link, receiver) = DryRunLink::new();
    let processor = CommandProcessor::new(link, Arc::new(LogSink));

    let timeout = CONF_MAP.get_usize("task_timeout_secs");
    if timeout > 0 {
        processor.set_task_timeout(Duration::from_secs(timeout as u64));
    }
    let shutdown_cmd = CONF_MAP.get_str("shutdown_cmd");
    if !shutdown_cmd.is_empty() {
        processor.set_shutdown_cmd(shutdown_cmd);
    }

    //干跑应答线程,所有任务直接回成功
    let responder = processor.clone();
    let res = std::thread::Builder::new()
        .name("RESPONDER_THREAD".to_owned())
        .spawn(move || {
            while let Ok(id) = receiver.recv() {
                responder.on_task_response(id, ERR_NONE);
            }
        });
    if let Err(e) = res {
        error!("{:?}", e);
        std::process::abort();
    }

    let data_path = CONF_MAP.get_str("data_path").to_owned();
    let (done_tx, done_rx) = crossbeam::channel::bounded(1);
    let res = processor.execute(
        r#"{"command":"self_test"}"#,
        data_path.as_str(),
        move |ok| {
            let _ = done_tx.send(ok);
        },
    );
    if let Err(e) = res {
        error!("{:?}", e);
        std::process::abort();
    }
    match done_rx.recv() {
        Ok(true) => info!("self test passed"),
        Ok(false) => error!("self test failed"),
        Err(e) => error!("{:?}", e),
    }
}
