use crate::mission::task_name::TaskName;
use crate::status::RobotState;

///回滚程序里的一个步骤
///失败时把robot_task退回revert_marker,这样再次取消可以从失败的路段继续
#[derive(Debug, Clone)]
pub struct RollbackStep {
    pub tasks: Vec<TaskName>,     //按顺序下发的任务
    pub revert_marker: TaskName,  //步骤失败时robot_task回退到的任务
    pub description: String,      //给操作员看的说明
}

impl RollbackStep {
    fn new(tasks: Vec<TaskName>, revert_marker: TaskName, description: &str) -> Self {
        RollbackStep {
            tasks,
            revert_marker,
            description: description.to_owned(),
        }
    }
}

///回滚表的查询结果
#[derive(Debug, Clone)]
pub enum Rollback {
    ///可以执行的回滚程序
    Program(Vec<RollbackStep>),
    ///park进行中被取消,载具还夹在夹爪上,需要人工释放
    ManualRelease,
    ///previous state没有初始化(Disabled/Error),无处可回
    NotInitialized,
    ///任务已经越过可取消点,不再回滚
    BeyondCancelPoint,
}

///按(取消前的状态, 最后下发的任务)查回滚表
///匹配按robot_task的完整文件名精确比较
pub fn build_rollback(previous: RobotState, robot_task: &str, bed_id: u32) -> Rollback {
    match previous {
        RobotState::Standby | RobotState::Idle => {
            // deliver/collect的去程: SafetyOn -> LF_parking_exit -> toBeds/...
            // 回滚链从中断的路段开始,逐段回到停靠点
            let chain = vec![
                RollbackStep::new(
                    vec![TaskName::SafetyOn, TaskName::LfBedToHallway(bed_id)],
                    TaskName::LfHallwayToBed(bed_id),
                    "go back from bed",
                ),
                RollbackStep::new(
                    vec![TaskName::SafetyOn, TaskName::LfHallwayToParking],
                    TaskName::LfParkingExit,
                    "go back from hallway",
                ),
                RollbackStep::new(
                    vec![TaskName::SafetyOff],
                    TaskName::SafetyOn,
                    "stand down at parking",
                ),
            ];
            let start = if robot_task == TaskName::LfHallwayToBed(bed_id).file_name() {
                0
            } else if robot_task == TaskName::LfParkingExit.file_name() {
                1
            } else if robot_task == TaskName::SafetyOn.file_name() {
                2
            } else {
                return Rollback::BeyondCancelPoint;
            };
            Rollback::Program(chain[start..].to_vec())
        }
        RobotState::Charging => Rollback::ManualRelease,
        RobotState::Disabled | RobotState::Error => Rollback::NotInitialized,
    }
}
