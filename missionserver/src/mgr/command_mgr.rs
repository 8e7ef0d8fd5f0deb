use crate::command::{CommandRequest, MissionCmd};
use crate::link::{StatusSink, TaskLink};
use crate::mission::generator;
use crate::mission::rollback::{self, Rollback, RollbackStep};
use crate::mission::submission::{MissionPlan, SubMission, Telemetry};
use crate::mission::task_name::TaskName;
use crate::status::*;
use crossbeam::atomic::AtomicCell;
use log::{error, info, warn};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

///等完成用的默认超时
pub const TASK_TIMEOUT: Duration = Duration::from_secs(600);

///当前未完成任务的等待槽
///completion回调、cancel和超时都落在这一个槽上,先写的生效
#[derive(Default)]
struct TaskWait {
    outstanding: i32, //当前未完成任务的关联id
    received: bool,   //完成结果是否已经写入
    status: i32,      //完成状态码
}

///指令处理器
///持有机器人状态机,把指令展开成任务计划后在独立线程上逐步执行,
///每一步阻塞等待完成或超时,失败立即放弃剩余步骤
pub struct CommandProcessor {
    link: Arc<dyn TaskLink>,
    sink: Arc<dyn StatusSink>,
    robot_state: AtomicCell<RobotState>,    //当前状态
    previous_state: AtomicCell<RobotState>, //指令开始前的状态,回滚的落点
    robot_task: Mutex<String>,              //最后一次下发的任务文件名
    last_bed_id: AtomicCell<u32>,           //最近一次配送的病床编号
    task_timeout: AtomicCell<Duration>,     //单个任务的完成超时
    shutdown_cmd: Mutex<Option<String>>,    //配置的关机命令
    busy: Mutex<bool>,                      //是否有任务线程在执行
    busy_cv: Condvar,
    wait: Mutex<TaskWait>,
    task_cv: Condvar,
}

impl CommandProcessor {
    pub fn new(link: Arc<dyn TaskLink>, sink: Arc<dyn StatusSink>) -> Arc<CommandProcessor> {
        Arc::new(CommandProcessor {
            link,
            sink,
            robot_state: AtomicCell::new(RobotState::Charging),
            previous_state: AtomicCell::new(RobotState::Charging),
            robot_task: Mutex::new(String::new()),
            last_bed_id: AtomicCell::new(0),
            task_timeout: AtomicCell::new(TASK_TIMEOUT),
            shutdown_cmd: Mutex::new(None),
            busy: Mutex::new(false),
            busy_cv: Condvar::new(),
            wait: Mutex::new(TaskWait::default()),
            task_cv: Condvar::new(),
        })
    }

    pub fn set_task_timeout(&self, timeout: Duration) {
        self.task_timeout.store(timeout);
    }

    pub fn set_shutdown_cmd(&self, cmd: &str) {
        *self.shutdown_cmd.lock().unwrap() = Some(cmd.to_owned());
    }

    pub fn robot_state(&self) -> RobotState {
        self.robot_state.load()
    }

    pub fn previous_state(&self) -> RobotState {
        self.previous_state.load()
    }

    pub fn robot_task(&self) -> String {
        self.robot_task.lock().unwrap().clone()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.lock().unwrap()
    }

    ///操作员手动初始化机器人状态,越过正常的状态迁移规则
    pub fn init_robot_state(&self, state: RobotState) {
        self.robot_state.store(state);
        self.sink
            .publish(ROBOT_STATUS_TOPIC, ROBOT_STATUS_FIELD, state.status_str());
    }

    ///外部完成回调,由链路在它自己的线程上调用
    ///id跟当前未完成任务不一致的完成直接忽略,过期的完成不会冒充后面的步骤
    pub fn on_task_response(&self, mission_id: i32, status: i32) {
        let mut wait = self.wait.lock().unwrap();
        if mission_id != wait.outstanding {
            warn!(
                "Error: Response mismatch. MissionID: {} ResponseID: {}",
                wait.outstanding, mission_id
            );
            return;
        }
        if wait.received {
            return;
        }
        wait.received = true;
        wait.status = status;
        self.task_cv.notify_all();
    }

    ///协作式取消:给当前未完成的任务合成一个已中止的完成结果,
    ///让阻塞中的任务线程立刻醒过来,不打断线程本身
    pub fn cancel(&self) {
        let mut wait = self.wait.lock().unwrap();
        if !wait.received {
            wait.received = true;
            wait.status = ERR_MISSION_ABORTED;
            self.task_cv.notify_all();
        }
    }

    ///接收一条JSON指令并在独立线程上执行,执行结果通过completion回调送回
    ///解析失败和未知指令立即返回错误;已有任务在执行时拒绝新指令(cancel_mission除外)
    pub fn execute(
        self: &Arc<Self>,
        mission_cmd: &str,
        data_path: &str,
        completion: impl FnOnce(bool) + Send + 'static,
    ) -> anyhow::Result<()> {
        let req: CommandRequest = serde_json::from_str(mission_cmd).map_err(|e| {
            error!("Cannot Decode incoming JSON Command: {} ({})", mission_cmd, e);
            MissionError::Decode(mission_cmd.to_owned())
        })?;
        let cmd = match MissionCmd::parse(req.command.as_str()) {
            Some(cmd) => cmd,
            None => {
                error!("Error: Unknown Command: {}", req.command);
                return Err(MissionError::UnknownCommand(req.command).into());
            }
        };

        let mut reserved = false;
        {
            let mut busy = self.busy.lock().unwrap();
            if *busy {
                if cmd != MissionCmd::CancelMission {
                    error!("Error: Robot is currently running a task. Ignoring new command!");
                    return Err(MissionError::RobotBusy.into());
                }
            } else {
                *busy = true;
                reserved = true;
            }
        }
        if cmd == MissionCmd::CancelMission && !reserved {
            // 先唤醒被阻塞的任务线程,回滚等它退出之后再跑
            self.cancel();
        }

        let processor = self.clone();
        let data_path = data_path.to_owned();
        let builder = std::thread::Builder::new().name("MISSION_THREAD".to_owned());
        let res = builder.spawn(move || {
            if !reserved {
                let mut busy = processor.busy.lock().unwrap();
                while *busy {
                    busy = processor.busy_cv.wait(busy).unwrap();
                }
                *busy = true;
                drop(busy);
            }
            let success = processor.run_mission(cmd, &req, &data_path);
            {
                let mut busy = processor.busy.lock().unwrap();
                *busy = false;
                processor.busy_cv.notify_all();
            }
            completion(success);
        });
        if let Err(e) = res {
            if reserved {
                let mut busy = self.busy.lock().unwrap();
                *busy = false;
                self.busy_cv.notify_all();
            }
            error!("{:?}", e);
            return Err(e.into());
        }
        Ok(())
    }

    ///任务线程入口
    fn run_mission(self: &Arc<Self>, cmd: MissionCmd, req: &CommandRequest, data_path: &str) -> bool {
        match cmd {
            MissionCmd::Enable => return self.do_enable(),
            MissionCmd::Disable => return self.do_disable(),
            MissionCmd::Shutdown => return self.do_shutdown(),
            MissionCmd::CancelMission => return self.do_cancel_mission(data_path),
            _ => {}
        }

        let state = self.robot_state.load();
        // 禁用状态下不执行任何任务计划
        if state == RobotState::Disabled {
            error!("Invalid Command. Robot is disabled: {}", cmd.tag());
            return false;
        }

        let bed_id = match req.bed_id {
            Some(id) => id,
            None => self.last_bed_id.load(),
        };
        let plan = match generator::build_plan(cmd, state, bed_id) {
            Ok(plan) => plan,
            Err(e) => {
                error!("{}", e);
                // 前置状态不满足,把当前状态重新发布一遍
                self.init_robot_state(state);
                return false;
            }
        };

        // 从正常状态开始执行的指令,记录取消时要回到的状态
        if state != RobotState::Disabled && state != RobotState::Error {
            self.previous_state.store(state);
        }
        if req.bed_id.is_some() {
            self.last_bed_id.store(bed_id);
        }

        self.sink
            .publish(ROBOT_STATUS_TOPIC, ROBOT_STATUS_FIELD, ROBOT_STATUS_BUSY);

        let success = self.run_plan(&plan, data_path);
        if success {
            if let Some(target) = plan.success_state {
                self.robot_state.store(target);
                self.previous_state.store(target);
            }
            self.sink
                .publish_bool(MISSION_STATUS_TOPIC, MISSION_STATUS_FIELD, MISSION_SUCCESS);
            for telemetry in plan.success_publishes.iter() {
                self.emit(telemetry);
            }
            info!("{} : Mission Successful", cmd.tag());
        } else {
            self.robot_state.store(RobotState::Error);
            self.sink
                .publish_bool(MISSION_STATUS_TOPIC, MISSION_STATUS_FIELD, MISSION_FAIL);
            self.sink
                .publish(ROBOT_STATUS_TOPIC, ROBOT_STATUS_FIELD, ROBOT_STATUS_ERROR);
            error!("{} : Mission Failed", cmd.tag());
            // 出错后尽量让避障保持开启;不经过robot_task,取消点要留给回滚表用
            if let Err(e) = self.send_task_raw(TaskName::SafetyOn, data_path) {
                warn!("{}", e);
            }
        }
        success
    }

    ///顺序执行计划,第一个失败的步骤终止整个计划
    fn run_plan(&self, plan: &MissionPlan, data_path: &str) -> bool {
        for sub in plan.steps.iter() {
            info!("SubMission: {}", sub.description);
            if !self.run_submission(sub, data_path) {
                return false;
            }
            for telemetry in sub.publishes.iter() {
                self.emit(telemetry);
            }
        }
        true
    }

    ///执行单个子任务,主任务最多下发retry_limit次
    ///任务文件读不到直接判失败,不重试
    fn run_submission(&self, sub: &SubMission, data_path: &str) -> bool {
        for attempt in 1..=sub.retry_limit {
            match self.send_task(sub.task, data_path) {
                Ok(()) => return true,
                Err(e @ MissionError::TaskFile(..)) => {
                    error!("{}", e);
                    return false;
                }
                Err(e) => {
                    error!("{}", e);
                    if attempt < sub.retry_limit {
                        info!(
                            "Retrying {} (attempt {}/{})",
                            sub.task,
                            attempt + 1,
                            sub.retry_limit
                        );
                    }
                }
            }
        }
        false
    }

    ///下发一个任务并记下它的名字,robot_task是回滚表的键
    fn send_task(&self, task: TaskName, data_path: &str) -> Result<(), MissionError> {
        {
            let mut robot_task = self.robot_task.lock().unwrap();
            *robot_task = task.file_name();
        }
        self.send_task_raw(task, data_path)
    }

    ///读任务文件、下发并阻塞等待完成或超时,不碰robot_task
    fn send_task_raw(&self, task: TaskName, data_path: &str) -> Result<(), MissionError> {
        let file_path = format!("{}/{}.txt", data_path, task.file_name());
        let payload = std::fs::read(&file_path)
            .map_err(|e| MissionError::TaskFile(file_path.clone(), e.to_string()))?;

        info!("Starting Mission {}", file_path);
        let wait = {
            let mut wait = self.wait.lock().unwrap();
            wait.received = false;
            wait.status = ERR_NONE;
            wait.outstanding = self.link.dispatch(payload);
            wait
        };
        let mission_id = wait.outstanding;
        let timeout = self.task_timeout.load();
        let (mut wait, res) = self
            .task_cv
            .wait_timeout_while(wait, timeout, |w| !w.received)
            .unwrap();
        if res.timed_out() && !wait.received {
            // 过期之后送达的完成不能再匹配上
            wait.outstanding = 0;
            wait.status = ERR_TIMEOUT;
            return Err(MissionError::TaskTimeout(mission_id));
        }
        if wait.status == ERR_NONE {
            info!("Mission {} completed successfully", file_path);
            Ok(())
        } else {
            Err(MissionError::TaskFailure(file_path, wait.status))
        }
    }

    fn emit(&self, telemetry: &Telemetry) {
        match telemetry {
            Telemetry::Msg {
                topic,
                field,
                value,
            } => self.sink.publish(topic, field, value),
            Telemetry::Bool {
                topic,
                field,
                value,
            } => self.sink.publish_bool(topic, field, *value),
        }
    }

    ///enable:被禁用时恢复禁用前的状态,否则重新发布当前状态
    fn do_enable(&self) -> bool {
        let state = self.robot_state.load();
        let new_state = if state == RobotState::Disabled {
            self.previous_state.load()
        } else {
            state
        };
        self.sink
            .publish_bool(MISSION_STATUS_TOPIC, MISSION_STATUS_FIELD, MISSION_SUCCESS);
        self.init_robot_state(new_state);
        true
    }

    ///disable:记录当前状态并禁用,不碰任何执行机构
    fn do_disable(&self) -> bool {
        self.previous_state.store(self.robot_state.load());
        self.robot_state.store(RobotState::Disabled);
        self.sink
            .publish_bool(MISSION_STATUS_TOPIC, MISSION_STATUS_FIELD, MISSION_SUCCESS);
        self.sink
            .publish(ROBOT_STATUS_TOPIC, ROBOT_STATUS_FIELD, ROBOT_STATUS_DISABLED);
        true
    }

    ///shutdown:执行配置里的关机命令,没配置就只记日志
    fn do_shutdown(&self) -> bool {
        let cmd = self.shutdown_cmd.lock().unwrap().clone();
        match cmd {
            Some(cmd) if !cmd.is_empty() => {
                info!("shutdown: running host shutdown command");
                // 等命令退出,不留僵尸进程
                let res = std::process::Command::new("sh").arg("-c").arg(&cmd).status();
                match res {
                    Ok(status) => info!("shutdown command exited: {}", status),
                    Err(e) => {
                        error!("{:?}", e);
                        return false;
                    }
                }
            }
            _ => info!("shutdown requested, no shutdown_cmd configured"),
        }
        true
    }

    ///取消回滚:按(previous_state, robot_task)查回滚表并执行
    ///对调用方恒定返回成功,回滚内部的失败只通知操作员
    fn do_cancel_mission(&self, data_path: &str) -> bool {
        let previous = self.previous_state.load();
        let robot_task = self.robot_task.lock().unwrap().clone();
        let bed_id = self.last_bed_id.load();
        info!("Last sub task: {}", robot_task);
        info!("Cancelling mission");

        match rollback::build_rollback(previous, robot_task.as_str(), bed_id) {
            Rollback::Program(steps) => {
                info!("Going back to {:?} State", previous);
                match self.run_rollback(&steps, data_path) {
                    Ok(()) => {
                        self.sink.publish(
                            ROBOT_LOCATION_TOPIC,
                            ROBOT_LOCATION_FIELD,
                            LOCATION_PARKING,
                        );
                        self.init_robot_state(previous);
                    }
                    Err(e) => {
                        // 回滚失败不自动重试,状态留在原地等操作员处理
                        error!("Error: Mission Cancellation failed! {}", e);
                    }
                }
            }
            Rollback::ManualRelease => info!("Please release the gripper manually"),
            Rollback::NotInitialized => {
                warn!("Cannot go back since previous state is not initialized")
            }
            Rollback::BeyondCancelPoint => warn!("Mission beyond cancellation point!"),
        }
        true
    }

    ///顺序执行回滚步骤,失败的步骤把robot_task退回revert_marker后停下,不重试
    fn run_rollback(&self, steps: &[RollbackStep], data_path: &str) -> Result<(), MissionError> {
        for step in steps.iter() {
            info!("Rollback: {}", step.description);
            for task in step.tasks.iter() {
                if let Err(e) = self.send_task(*task, data_path) {
                    error!("{}", e);
                    let mut robot_task = self.robot_task.lock().unwrap();
                    *robot_task = step.revert_marker.file_name();
                    return Err(MissionError::RollbackFailure(step.description.clone()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::{bounded, Receiver, Sender};
    use std::path::PathBuf;
    use std::sync::Mutex;

    ///把所有遥测记下来的假发布通道
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<(String, String, String)>>,
    }

    impl StatusSink for Recorder {
        fn publish(&self, topic: &str, field: &str, value: &str) {
            self.events
                .lock()
                .unwrap()
                .push((topic.to_owned(), field.to_owned(), value.to_owned()));
        }

        fn publish_bool(&self, topic: &str, field: &str, value: bool) {
            self.events
                .lock()
                .unwrap()
                .push((topic.to_owned(), field.to_owned(), value.to_string()));
        }
    }

    impl Recorder {
        fn clear(&self) {
            self.events.lock().unwrap().clear();
        }

        fn is_empty(&self) -> bool {
            self.events.lock().unwrap().is_empty()
        }

        fn locations(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(topic, _, _)| topic == ROBOT_LOCATION_TOPIC)
                .map(|(_, _, value)| value.clone())
                .collect()
        }

        fn contains(&self, topic: &str, field: &str, value: &str) -> bool {
            self.events
                .lock()
                .unwrap()
                .iter()
                .any(|(t, f, v)| t == topic && f == field && v == value)
        }
    }

    ///把下发的关联id丢给应答线程的假链路
    struct TestLink {
        next_id: AtomicCell<i32>,
        dispatched: AtomicCell<u32>,
        sender: Sender<i32>,
    }

    impl TestLink {
        fn new() -> (Arc<TestLink>, Receiver<i32>) {
            let (sender, receiver) = bounded(64);
            let link = TestLink {
                next_id: AtomicCell::new(100),
                dispatched: AtomicCell::new(0),
                sender,
            };
            (Arc::new(link), receiver)
        }

        fn dispatched(&self) -> u32 {
            self.dispatched.load()
        }
    }

    impl TaskLink for TestLink {
        fn dispatch(&self, _payload: Vec<u8>) -> i32 {
            self.dispatched.fetch_add(1);
            let id = self.next_id.fetch_add(1);
            let _ = self.sender.send(id);
            id
        }
    }

    ///在临时目录里铺好所有任务文件
    fn task_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "missionserver_test_{}_{}",
            tag,
            std::process::id()
        ));
        let mut tasks = vec![
            TaskName::GripperExtend,
            TaskName::GripperRetract,
            TaskName::GripperClamp,
            TaskName::GripperRelease,
            TaskName::GripperExtendedClamp,
            TaskName::GripperExtendedRelease,
            TaskName::Dock,
            TaskName::Undock,
            TaskName::SafetyOn,
            TaskName::SafetyOff,
            TaskName::CollectFromBed,
            TaskName::CollectFromManipulator,
            TaskName::ReleaseToBed,
            TaskName::ReleaseToManipulator,
            TaskName::LfChargerToManipulator,
            TaskName::LfManipulatorToHallway,
            TaskName::LfHallwayToParking,
            TaskName::LfParkingExit,
            TaskName::LfHallwayToManipulator,
            TaskName::LfManipulatorToCharger,
        ];
        for bed_id in [3u32, 5u32] {
            tasks.push(TaskName::LfHallwayToBed(bed_id));
            tasks.push(TaskName::LfBedToHallway(bed_id));
            tasks.push(TaskName::LfBedExit(bed_id));
        }
        for task in tasks {
            let path = dir.join(format!("{}.txt", task.file_name()));
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"{}").unwrap();
        }
        dir
    }

    fn setup(tag: &str) -> (Arc<CommandProcessor>, Arc<Recorder>, Arc<TestLink>, Receiver<i32>, String) {
        let (link, receiver) = TestLink::new();
        let recorder = Arc::new(Recorder::default());
        let processor = CommandProcessor::new(link.clone(), recorder.clone());
        processor.set_task_timeout(Duration::from_millis(300));
        let dir = task_dir(tag).to_string_lossy().into_owned();
        (processor, recorder, link, receiver, dir)
    }

    ///应答线程,script返回None表示这次下发不应答
    fn respond(
        processor: &Arc<CommandProcessor>,
        receiver: Receiver<i32>,
        script: impl Fn(u32) -> Option<i32> + Send + 'static,
    ) {
        let processor = processor.clone();
        std::thread::spawn(move || {
            let mut seq = 0u32;
            while let Ok(id) = receiver.recv() {
                seq += 1;
                if let Some(status) = script(seq) {
                    std::thread::sleep(Duration::from_millis(5));
                    processor.on_task_response(id, status);
                }
            }
        });
    }

    fn execute(
        processor: &Arc<CommandProcessor>,
        cmd: &str,
        dir: &str,
    ) -> Receiver<bool> {
        let (done_tx, done_rx) = bounded(1);
        processor
            .execute(cmd, dir, move |ok| {
                let _ = done_tx.send(ok);
            })
            .unwrap();
        done_rx
    }

    fn recv(done: &Receiver<bool>) -> bool {
        done.recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn deliver_full_success() {
        let (processor, recorder, _link, receiver, dir) = setup("deliver_ok");
        processor.init_robot_state(RobotState::Standby);
        recorder.clear();
        respond(&processor, receiver, |_| Some(ERR_NONE));

        let done = execute(&processor, r#"{"command":"deliver","bed_id":3}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Idle);
        assert_eq!(processor.previous_state(), RobotState::Idle);
        assert_eq!(
            recorder.locations(),
            vec!["hallway", "bed_3", "hallway", "parking"]
        );
        assert!(recorder.contains(MISSION_STATUS_TOPIC, MISSION_STATUS_FIELD, "true"));
    }

    #[test]
    fn collect_times_out_mid_plan() {
        let (processor, _recorder, link, receiver, dir) = setup("collect_timeout");
        processor.init_robot_state(RobotState::Idle);
        processor.set_task_timeout(Duration::from_millis(200));
        // 前两个任务正常完成,第3个(去病床的路段)之后全部失联
        respond(&processor, receiver, |seq| {
            if seq <= 2 {
                Some(ERR_NONE)
            } else {
                None
            }
        });

        let done = execute(&processor, r#"{"command":"collect","bed_id":5}"#, &dir);
        assert!(!recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Error);
        // robot_task停在超时的那一步,出错后的SafetyOn补救不会动它
        assert_eq!(processor.robot_task(), "toBeds/LF_hallway_to_bed_5");
        // 3步计划任务 + 1次SafetyOn补救,后面的步骤没有再下发
        assert_eq!(link.dispatched(), 4);
    }

    #[test]
    fn cancel_mid_collect_rolls_back_to_idle() {
        let (processor, recorder, _link, receiver, dir) = setup("cancel_collect");
        processor.init_robot_state(RobotState::Idle);
        recorder.clear();
        // 第3个下发不应答,其余(包括回滚任务)都成功
        let (stall_tx, stall_rx) = bounded(1);
        {
            let processor = processor.clone();
            std::thread::spawn(move || {
                let mut seq = 0u32;
                while let Ok(id) = receiver.recv() {
                    seq += 1;
                    if seq == 3 {
                        let _ = stall_tx.send(id);
                        continue;
                    }
                    std::thread::sleep(Duration::from_millis(5));
                    processor.on_task_response(id, ERR_NONE);
                }
            });
        }

        let done = execute(&processor, r#"{"command":"collect","bed_id":5}"#, &dir);
        // 第3步已经下发并阻塞等待
        stall_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let cancel_done = execute(&processor, r#"{"command":"cancel_mission"}"#, &dir);

        // 原任务立刻以失败收场,取消本身恒定成功
        assert!(!recv(&done));
        assert!(recv(&cancel_done));
        // 回滚成功后回到取消前的状态
        assert_eq!(processor.robot_state(), RobotState::Idle);
        assert_eq!(recorder.locations().last().unwrap(), LOCATION_PARKING);
    }

    #[test]
    fn park_reaches_standby() {
        let (processor, recorder, _link, receiver, dir) = setup("park_ok");
        processor.init_robot_state(RobotState::Charging);
        recorder.clear();
        respond(&processor, receiver, |_| Some(ERR_NONE));

        let done = execute(&processor, r#"{"command":"park"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Standby);
        assert_eq!(recorder.locations().last().unwrap(), LOCATION_PARKING);
        assert!(recorder.contains(DOOR_CONTROL_TOPIC, DOOR_CONTROL_FIELD, "true"));
        assert!(recorder.contains(DOOR_CONTROL_TOPIC, DOOR_CONTROL_FIELD, "false"));
    }

    #[test]
    fn unknown_command_is_rejected_without_side_effects() {
        let (processor, recorder, link, _receiver, dir) = setup("unknown");
        let res = processor.execute(r#"{"command":"unknown_xyz"}"#, &dir, |_| {});
        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MissionError>(),
            Some(MissionError::UnknownCommand(_))
        ));
        assert_eq!(processor.robot_state(), RobotState::Charging);
        assert!(recorder.is_empty());
        assert_eq!(link.dispatched(), 0);
    }

    #[test]
    fn malformed_json_is_rejected() {
        let (processor, recorder, link, _receiver, dir) = setup("decode");
        let res = processor.execute("deliver to bed 3", &dir, |_| {});
        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MissionError>(),
            Some(MissionError::Decode(_))
        ));
        assert!(recorder.is_empty());
        assert_eq!(link.dispatched(), 0);
    }

    #[test]
    fn precondition_failure_dispatches_nothing() {
        let (processor, recorder, link, _receiver, dir) = setup("precondition");
        // 默认Charging,deliver要求Standby
        let done = execute(&processor, r#"{"command":"deliver","bed_id":3}"#, &dir);
        assert!(!recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Charging);
        assert_eq!(link.dispatched(), 0);
        // 不发busy,只把当前状态重发一遍
        assert!(!recorder.contains(ROBOT_STATUS_TOPIC, ROBOT_STATUS_FIELD, ROBOT_STATUS_BUSY));
        assert!(recorder.contains(ROBOT_STATUS_TOPIC, ROBOT_STATUS_FIELD, ROBOT_STATUS_CHARGING));
    }

    #[test]
    fn busy_robot_rejects_second_command() {
        let (processor, _recorder, _link, receiver, dir) = setup("busy");
        // 应答慢一点,让第一条指令停留在执行中
        {
            let processor = processor.clone();
            std::thread::spawn(move || {
                while let Ok(id) = receiver.recv() {
                    std::thread::sleep(Duration::from_millis(100));
                    processor.on_task_response(id, ERR_NONE);
                }
            });
        }

        let done = execute(&processor, r#"{"command":"gripper_clamp"}"#, &dir);
        let res = processor.execute(r#"{"command":"dock"}"#, &dir, |_| {});
        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MissionError>(),
            Some(MissionError::RobotBusy)
        ));
        // 被拒绝的指令不影响进行中任务的结果
        assert!(recv(&done));
    }

    #[test]
    fn mismatched_completion_is_ignored() {
        let (processor, _recorder, _link, receiver, dir) = setup("mismatch");
        {
            let processor = processor.clone();
            std::thread::spawn(move || {
                let id = receiver.recv().unwrap();
                // 错误id带着失败状态,要是被误认任务就会失败
                processor.on_task_response(id + 1000, 7);
                std::thread::sleep(Duration::from_millis(50));
                processor.on_task_response(id, ERR_NONE);
            });
        }

        let done = execute(&processor, r#"{"command":"gripper_clamp"}"#, &dir);
        assert!(recv(&done));
    }

    #[test]
    fn cancel_without_active_mission_is_noop_success() {
        let (processor, _recorder, link, _receiver, dir) = setup("cancel_noop");
        let done = execute(&processor, r#"{"command":"cancel_mission"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Charging);
        assert_eq!(link.dispatched(), 0);

        // 重复取消还是一样
        let done = execute(&processor, r#"{"command":"cancel_mission"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Charging);
        assert_eq!(link.dispatched(), 0);
    }

    #[test]
    fn disable_blocks_plans_and_enable_restores() {
        let (processor, _recorder, link, _receiver, dir) = setup("disable");
        processor.init_robot_state(RobotState::Standby);

        let done = execute(&processor, r#"{"command":"disable"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Disabled);

        // 禁用期间不执行任何任务计划
        let done = execute(&processor, r#"{"command":"dock"}"#, &dir);
        assert!(!recv(&done));
        assert_eq!(link.dispatched(), 0);
        assert_eq!(processor.robot_state(), RobotState::Disabled);

        let done = execute(&processor, r#"{"command":"enable"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Standby);
    }

    #[test]
    fn dock_retries_failed_docking_once() {
        let (processor, _recorder, link, receiver, dir) = setup("dock_retry");
        processor.init_robot_state(RobotState::Idle);
        // SafetyOff成功,第一次对桩失败,重发后成功
        respond(&processor, receiver, |seq| {
            if seq == 2 {
                Some(7)
            } else {
                Some(ERR_NONE)
            }
        });

        let done = execute(&processor, r#"{"command":"dock"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Charging);
        assert_eq!(link.dispatched(), 3);
    }

    #[test]
    fn self_test_resets_previous_state() {
        let (processor, _recorder, _link, receiver, dir) = setup("self_test");
        processor.init_robot_state(RobotState::Standby);
        respond(&processor, receiver, |_| Some(ERR_NONE));

        let done = execute(&processor, r#"{"command":"self_test"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Charging);
        assert_eq!(processor.previous_state(), RobotState::Charging);
    }

    #[test]
    fn door_commands_publish_without_dispatch() {
        let (processor, recorder, link, _receiver, dir) = setup("door");
        let done = execute(&processor, r#"{"command":"door_open"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(link.dispatched(), 0);
        assert!(recorder.contains(DOOR_CONTROL_TOPIC, DOOR_CONTROL_FIELD, "true"));
        // 状态不变
        assert_eq!(processor.robot_state(), RobotState::Charging);
    }

    #[test]
    fn missing_task_file_fails_without_dispatch() {
        let (processor, _recorder, link, _receiver, dir) = setup("missing_file");
        // 删掉Undock的任务文件
        std::fs::remove_file(format!("{}/Undock.txt", dir)).unwrap();
        let done = execute(&processor, r#"{"command":"undock"}"#, &dir);
        assert!(!recv(&done));
        // 文件读不到的步骤不会下发,后面补救的SafetyOn会下发但没人应答
        assert_eq!(processor.robot_state(), RobotState::Error);
        assert_eq!(link.dispatched(), 1);
    }

    #[test]
    fn collect_without_bed_id_reuses_last_delivery() {
        let (processor, _recorder, _link, receiver, dir) = setup("last_bed");
        processor.init_robot_state(RobotState::Standby);
        respond(&processor, receiver, |_| Some(ERR_NONE));

        let done = execute(&processor, r#"{"command":"deliver","bed_id":3}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Idle);

        // collect不带bed_id,沿用deliver的3号床
        let done = execute(&processor, r#"{"command":"collect"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(processor.robot_state(), RobotState::Charging);
    }

    #[test]
    fn failed_rollback_step_rewinds_checkpoint() {
        let (processor, recorder, _link, receiver, dir) = setup("rollback_resume");
        processor.init_robot_state(RobotState::Idle);
        recorder.clear();
        // 第3个下发不应答,第一次回滚里的回程路段失败,其余都成功
        let (stall_tx, stall_rx) = bounded(1);
        {
            let processor = processor.clone();
            std::thread::spawn(move || {
                let mut seq = 0u32;
                while let Ok(id) = receiver.recv() {
                    seq += 1;
                    if seq == 3 {
                        let _ = stall_tx.send(id);
                        continue;
                    }
                    std::thread::sleep(Duration::from_millis(5));
                    let status = if seq == 6 { 9 } else { ERR_NONE };
                    processor.on_task_response(id, status);
                }
            });
        }

        let done = execute(&processor, r#"{"command":"collect","bed_id":5}"#, &dir);
        stall_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        let cancel_done = execute(&processor, r#"{"command":"cancel_mission"}"#, &dir);
        assert!(!recv(&done));
        // 取消对调用方照样报成功,但回滚没有走完
        assert!(recv(&cancel_done));
        // robot_task退回失败步骤的检查点,状态原地不动
        assert_eq!(processor.robot_task(), "toBeds/LF_hallway_to_bed_5");
        assert_eq!(processor.robot_state(), RobotState::Error);
        assert!(recorder.locations().is_empty() || recorder.locations().last().unwrap() != LOCATION_PARKING);

        // 再取消一次,从检查点重新进入回滚链并走完
        let cancel_done = execute(&processor, r#"{"command":"cancel_mission"}"#, &dir);
        assert!(recv(&cancel_done));
        assert_eq!(processor.robot_state(), RobotState::Idle);
        assert_eq!(recorder.locations().last().unwrap(), LOCATION_PARKING);
    }

    #[test]
    fn shutdown_runs_configured_command() {
        let (processor, _recorder, link, _receiver, dir) = setup("shutdown_cmd");
        processor.set_shutdown_cmd("true");
        let done = execute(&processor, r#"{"command":"shutdown"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(link.dispatched(), 0);
        assert_eq!(processor.robot_state(), RobotState::Charging);
    }

    #[test]
    fn shutdown_without_command_is_noop_success() {
        let (processor, _recorder, link, _receiver, dir) = setup("shutdown_noop");
        let done = execute(&processor, r#"{"command":"shutdown"}"#, &dir);
        assert!(recv(&done));
        assert_eq!(link.dispatched(), 0);
    }
}
